//! Mapped micro-ORM strategy: a generic insert derives its SQL from the
//! entity's static mapping table.

use super::{RowWriter, StrategyKind, Transactional};
use crate::mapping::{self, Entity};
use anyhow::Result;
use crm_core::{Company, Contact};
use rusqlite::Connection;

#[derive(Debug, Default, Clone, Copy)]
pub struct MappedWriter;

pub type MappedInserter = Transactional<MappedWriter>;

impl RowWriter for MappedWriter {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Mapped
    }

    fn insert_company(&self, conn: &Connection, company: &mut Company) -> Result<i64> {
        mapping::insert_with(conn, Company::mapping(), company)
    }

    fn insert_contact(&self, conn: &Connection, contact: &mut Contact) -> Result<i64> {
        mapping::insert_with(conn, Contact::mapping(), contact)
    }
}
