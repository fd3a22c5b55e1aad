//! The five insert strategies behind one [`Inserter`] capability.
//!
//! | Strategy      | Context           | Transaction boundary | Session checkout in window |
//! |---------------|-------------------|----------------------|----------------------------|
//! | `tracked`     | session factory   | per company          | yes                        |
//! | `batched`     | session factory   | per chunk            | yes                        |
//! | `direct-sql`  | connection        | whole batch          | no                         |
//! | `mapped`      | connection        | whole batch          | no                         |
//! | `raw-command` | connection        | whole batch          | no                         |

pub mod batched;
pub mod direct_sql;
pub mod mapped;
pub mod raw_command;
pub mod tracked;
pub mod transactional;

use crate::store::StoreTarget;
use anyhow::{bail, Result};
use crm_core::CompanyGraph;
use std::fmt;
use std::str::FromStr;

pub use batched::BatchedInserter;
pub use direct_sql::{DirectSqlInserter, DirectSqlWriter};
pub use mapped::{MappedInserter, MappedWriter};
pub use raw_command::{RawCommandInserter, RawCommandWriter};
pub use tracked::TrackedInserter;
pub use transactional::{RowWriter, Transactional};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    Tracked,
    Batched,
    DirectSql,
    Mapped,
    RawCommand,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Tracked,
        StrategyKind::Batched,
        StrategyKind::DirectSql,
        StrategyKind::Mapped,
        StrategyKind::RawCommand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Tracked => "tracked",
            StrategyKind::Batched => "batched",
            StrategyKind::DirectSql => "direct-sql",
            StrategyKind::Mapped => "mapped",
            StrategyKind::RawCommand => "raw-command",
        }
    }

    /// Database file stem and environment variable suffix source.
    pub fn file_stem(self) -> &'static str {
        match self {
            StrategyKind::Tracked => "tracked",
            StrategyKind::Batched => "batched",
            StrategyKind::DirectSql => "direct_sql",
            StrategyKind::Mapped => "mapped",
            StrategyKind::RawCommand => "raw_command",
        }
    }

    /// Whether the strategy checks its sessions out inside `insert_batch`,
    /// i.e. inside the default measurement window.
    pub fn acquires_context_in_window(self) -> bool {
        matches!(self, StrategyKind::Tracked | StrategyKind::Batched)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        match StrategyKind::ALL.iter().find(|k| k.name() == wanted) {
            Some(kind) => Ok(*kind),
            None => bail!("unknown strategy '{s}'"),
        }
    }
}

/// Rows written by one `insert_batch`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertStats {
    pub companies: usize,
    pub contacts: usize,
}

impl InsertStats {
    pub fn record(&mut self, graph: &CompanyGraph) {
        self.companies += 1;
        self.contacts += graph.contacts.len();
    }
}

/// One insert strategy. The context is created by `setup`, threaded through
/// `insert_batch` and consumed by `teardown`; nothing is kept between
/// iterations.
pub trait Inserter {
    type Context;

    fn kind(&self) -> StrategyKind;

    fn setup(&self, target: &StoreTarget) -> Result<Self::Context>;

    /// Consume `records` and write them. An error means nothing from the
    /// failing transaction is visible.
    fn insert_batch<R>(&self, ctx: &mut Self::Context, records: R) -> Result<InsertStats>
    where
        R: Iterator<Item = CompanyGraph>;

    fn teardown(&self, ctx: Self::Context) -> Result<()> {
        drop(ctx);
        Ok(())
    }
}
