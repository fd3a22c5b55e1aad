//! Bulk strategy: company graphs are gathered into chunks and each chunk is
//! written through the session's bulk insert in its own transaction.

use super::{InsertStats, Inserter, StrategyKind};
use crate::session::{BulkConfig, SessionFactory};
use crate::store::StoreTarget;
use anyhow::{ensure, Context as _, Result};
use crm_core::CompanyGraph;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct BatchedInserter {
    pub chunk_size: usize,
    pub bulk: BulkConfig,
}

impl Default for BatchedInserter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            bulk: BulkConfig::default(),
        }
    }
}

impl BatchedInserter {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }
}

impl Inserter for BatchedInserter {
    type Context = SessionFactory;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Batched
    }

    fn setup(&self, target: &StoreTarget) -> Result<SessionFactory> {
        ensure!(self.chunk_size > 0, "chunk size must be positive");
        Ok(SessionFactory::new(target))
    }

    fn insert_batch<R>(&self, factory: &mut SessionFactory, mut records: R) -> Result<InsertStats>
    where
        R: Iterator<Item = CompanyGraph>,
    {
        let mut stats = InsertStats::default();
        let mut chunk: Vec<CompanyGraph> = Vec::with_capacity(self.chunk_size);

        loop {
            chunk.clear();
            chunk.extend(records.by_ref().take(self.chunk_size));
            if chunk.is_empty() {
                break;
            }

            let mut session = factory.create_session()?;
            let first = stats.companies + 1;
            let outcome = session
                .bulk_insert(&mut chunk, &self.bulk)
                .with_context(|| format!("batched: chunk starting at company #{first}"))?;

            stats.companies += outcome.companies;
            stats.contacts += outcome.contacts;
        }

        Ok(stats)
    }
}
