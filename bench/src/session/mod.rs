//! Change-tracking session over one pooled connection.
//!
//! A [`SessionFactory`] is created once per iteration and hands out
//! [`Session`]s; dropping a session returns its connection to the factory's
//! idle pool. A session tracks every entity it is given:
//!
//! | State       | Meaning                                        | On save |
//! |-------------|------------------------------------------------|---------|
//! | `Added`     | not in the store yet                           | INSERT  |
//! | `Unchanged` | saved; a snapshot of its column values is kept | nothing |
//!
//! Rows are never updated once written. `save_changes` compares every saved
//! entity with its snapshot and refuses to save if one has drifted, then
//! inserts the added entities in one transaction, fixing up child foreign
//! keys once their parent has an id, and only then accepts the new states.

pub mod bulk;

use crate::mapping::{self, Entity};
use crate::store::{self, StoreTarget};
use anyhow::{anyhow, bail, Result};
use crm_core::{Company, CompanyGraph, Contact};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::cell::RefCell;

pub use bulk::{BulkConfig, BulkOutcome};

/// Idle connections kept by a factory between sessions.
pub const DEFAULT_POOL_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Added,
    Unchanged,
}

/// One tracked entity plus the column values it had when saved.
#[derive(Debug)]
struct Tracked<E> {
    entity: E,
    state: EntityState,
    snapshot: Option<Vec<Value>>,
}

impl<E: Entity> Tracked<E> {
    fn added(entity: E) -> Self {
        Self {
            entity,
            state: EntityState::Added,
            snapshot: None,
        }
    }

    fn is_pending(&self) -> Result<bool> {
        match self.state {
            EntityState::Added => Ok(true),
            EntityState::Unchanged => {
                if self.snapshot.as_ref() != Some(&self.entity.values()) {
                    bail!(
                        "{} {} changed after it was saved",
                        E::mapping().table,
                        self.entity.id()
                    );
                }
                Ok(false)
            }
        }
    }

    fn accept(&mut self) {
        self.state = EntityState::Unchanged;
        self.snapshot = Some(self.entity.values());
    }
}

#[derive(Debug)]
struct TrackedContact {
    tracked: Tracked<Contact>,
    /// Index of the owning company in `ChangeTracker::companies`.
    parent: usize,
}

#[derive(Debug, Default)]
struct ChangeTracker {
    companies: Vec<Tracked<Company>>,
    contacts: Vec<TrackedContact>,
}

impl ChangeTracker {
    /// Number of entities waiting to be inserted.
    fn detect_changes(&self) -> Result<usize> {
        let mut pending = 0;
        for company in &self.companies {
            pending += usize::from(company.is_pending()?);
        }
        for contact in &self.contacts {
            pending += usize::from(contact.tracked.is_pending()?);
        }
        Ok(pending)
    }

    /// Insert added entities. Ids and foreign keys are assigned here, states
    /// are left untouched so a rolled back save can be retried.
    fn flush(&mut self, conn: &Connection) -> Result<usize> {
        let mut inserted = 0;

        for company in &mut self.companies {
            if company.state == EntityState::Added {
                mapping::insert(conn, &mut company.entity)?;
                inserted += 1;
            }
        }

        for contact in &mut self.contacts {
            if contact.tracked.state == EntityState::Added {
                contact.tracked.entity.company_id = self.companies[contact.parent].entity.id;
                mapping::insert(conn, &mut contact.tracked.entity)?;
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    /// Undo id assignment for entities that were `Added` when a save failed.
    fn discard_pending_ids(&mut self) {
        for company in &mut self.companies {
            if company.state == EntityState::Added {
                company.entity.id = 0;
            }
        }
        for contact in &mut self.contacts {
            if contact.tracked.state == EntityState::Added {
                contact.tracked.entity.id = 0;
                contact.tracked.entity.company_id = 0;
            }
        }
    }

    fn accept_changes(&mut self) {
        for company in &mut self.companies {
            company.accept();
        }
        for contact in &mut self.contacts {
            contact.tracked.accept();
        }
    }
}

/// Creates sessions against one store target and pools their connections.
pub struct SessionFactory {
    target: StoreTarget,
    idle: RefCell<Vec<Connection>>,
    pool_size: usize,
}

impl SessionFactory {
    pub fn new(target: &StoreTarget) -> Self {
        Self::with_pool_size(target, DEFAULT_POOL_SIZE)
    }

    pub fn with_pool_size(target: &StoreTarget, pool_size: usize) -> Self {
        Self {
            target: target.clone(),
            idle: RefCell::new(Vec::new()),
            pool_size,
        }
    }

    /// Check out a session, reusing an idle connection when one is pooled.
    pub fn create_session(&self) -> Result<Session<'_>> {
        let pooled = self.idle.borrow_mut().pop();
        let conn = match pooled {
            Some(conn) => conn,
            None => store::connect(&self.target)?,
        };
        Ok(Session {
            factory: self,
            conn: Some(conn),
            tracker: ChangeTracker::default(),
        })
    }

    pub fn idle_connections(&self) -> usize {
        self.idle.borrow().len()
    }

    fn release(&self, conn: Connection) {
        let mut idle = self.idle.borrow_mut();
        if idle.len() < self.pool_size {
            idle.push(conn);
        }
    }
}

/// Unit of work over one connection checked out of a [`SessionFactory`].
pub struct Session<'f> {
    factory: &'f SessionFactory,
    conn: Option<Connection>,
    tracker: ChangeTracker,
}

impl Session<'_> {
    fn connection(&mut self) -> Result<&mut Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| anyhow!("session connection already released"))
    }

    /// Start tracking a graph; every entity in it is `Added`. Returns the
    /// company's index in this session.
    pub fn add(&mut self, graph: CompanyGraph) -> usize {
        let parent = self.tracker.companies.len();
        self.tracker.companies.push(Tracked::added(graph.company));
        self.tracker
            .contacts
            .extend(graph.contacts.into_iter().map(|contact| TrackedContact {
                tracked: Tracked::added(contact),
                parent,
            }));
        parent
    }

    /// Insert everything added since the last save in one transaction and
    /// return the number of rows written.
    pub fn save_changes(&mut self) -> Result<usize> {
        if self.tracker.detect_changes()? == 0 {
            return Ok(0);
        }

        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| anyhow!("session connection already released"))?;
        let tx = conn.transaction()?;
        let inserted = match self.tracker.flush(&tx) {
            Ok(inserted) => inserted,
            Err(err) => {
                drop(tx);
                self.tracker.discard_pending_ids();
                return Err(err);
            }
        };
        if let Err(err) = tx.commit() {
            self.tracker.discard_pending_ids();
            return Err(err.into());
        }

        self.tracker.accept_changes();
        Ok(inserted)
    }

    pub fn companies(&self) -> impl Iterator<Item = &Company> {
        self.tracker.companies.iter().map(|c| &c.entity)
    }

    pub fn contacts_of(&self, company: usize) -> impl Iterator<Item = &Contact> {
        self.tracker
            .contacts
            .iter()
            .filter(move |c| c.parent == company)
            .map(|c| &c.tracked.entity)
    }

    pub fn state_of_company(&self, company: usize) -> Option<EntityState> {
        self.tracker.companies.get(company).map(|c| c.state)
    }

    pub fn tracked_entities(&self) -> usize {
        self.tracker.companies.len() + self.tracker.contacts.len()
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.factory.release(conn);
        }
    }
}
