//! Shared shape of the direct-sql, mapped and raw-command strategies: one
//! connection opened in setup, one transaction around the whole batch,
//! company row first, then its contacts with the fresh parent id.

use super::{InsertStats, Inserter, StrategyKind};
use crate::store::{self, StoreTarget};
use anyhow::{Context as _, Result};
use crm_core::{Company, CompanyGraph, Contact};
use rusqlite::Connection;

/// How a single row reaches the store. Implementations return the
/// store-assigned id and write it into the entity.
pub trait RowWriter {
    fn kind(&self) -> StrategyKind;

    fn insert_company(&self, conn: &Connection, company: &mut Company) -> Result<i64>;

    fn insert_contact(&self, conn: &Connection, contact: &mut Contact) -> Result<i64>;
}

/// [`Inserter`] running a [`RowWriter`] inside a single transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct Transactional<W> {
    writer: W,
}

impl<W: RowWriter> Inserter for Transactional<W> {
    type Context = Connection;

    fn kind(&self) -> StrategyKind {
        self.writer.kind()
    }

    fn setup(&self, target: &StoreTarget) -> Result<Connection> {
        store::connect(target)
    }

    fn insert_batch<R>(&self, conn: &mut Connection, records: R) -> Result<InsertStats>
    where
        R: Iterator<Item = CompanyGraph>,
    {
        let tx = conn.transaction()?;
        let mut stats = InsertStats::default();

        for mut graph in records {
            let position = stats.companies + 1;
            self.writer
                .insert_company(&tx, &mut graph.company)
                .with_context(|| format!("{}: inserting company #{position}", self.kind()))?;
            graph.fix_up_foreign_keys();
            for contact in &mut graph.contacts {
                self.writer
                    .insert_contact(&tx, contact)
                    .with_context(|| format!("{}: inserting contact", self.kind()))?;
            }
            stats.record(&graph);
        }

        tx.commit()?;
        Ok(stats)
    }

    fn teardown(&self, conn: Connection) -> Result<()> {
        conn.close().map_err(|(_, err)| err)?;
        Ok(())
    }
}
