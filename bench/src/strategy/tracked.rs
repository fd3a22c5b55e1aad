//! Change-tracked strategy: one session and one `save_changes` per company,
//! so every company commits on its own.

use super::{InsertStats, Inserter, StrategyKind};
use crate::session::SessionFactory;
use crate::store::StoreTarget;
use anyhow::{Context as _, Result};
use crm_core::CompanyGraph;

#[derive(Debug, Default, Clone, Copy)]
pub struct TrackedInserter;

impl Inserter for TrackedInserter {
    type Context = SessionFactory;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Tracked
    }

    fn setup(&self, target: &StoreTarget) -> Result<SessionFactory> {
        Ok(SessionFactory::new(target))
    }

    fn insert_batch<R>(&self, factory: &mut SessionFactory, records: R) -> Result<InsertStats>
    where
        R: Iterator<Item = CompanyGraph>,
    {
        let mut stats = InsertStats::default();

        for graph in records {
            let mut session = factory.create_session()?;
            let contacts = graph.contacts.len();
            session.add(graph);
            session
                .save_changes()
                .with_context(|| format!("tracked: saving company #{}", stats.companies + 1))?;

            stats.companies += 1;
            stats.contacts += contacts;
        }

        Ok(stats)
    }
}
