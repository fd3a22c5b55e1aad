//! Micro-ORM strategy: hand-written INSERT text, parameters bound by name,
//! id read back as the single row the statement returns.

use super::{RowWriter, StrategyKind, Transactional};
use crate::micro::{self, INSERT_COMPANY_SQL, INSERT_CONTACT_SQL};
use anyhow::Result;
use crm_core::{Company, Contact};
use rusqlite::Connection;

#[derive(Debug, Default, Clone, Copy)]
pub struct DirectSqlWriter;

pub type DirectSqlInserter = Transactional<DirectSqlWriter>;

impl RowWriter for DirectSqlWriter {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DirectSql
    }

    fn insert_company(&self, conn: &Connection, company: &mut Company) -> Result<i64> {
        company.id = micro::query_single(conn, INSERT_COMPANY_SQL, &*company)?;
        Ok(company.id)
    }

    fn insert_contact(&self, conn: &Connection, contact: &mut Contact) -> Result<i64> {
        contact.id = micro::query_single(conn, INSERT_CONTACT_SQL, &*contact)?;
        Ok(contact.id)
    }
}
