//! Raw command strategy: a new command object per row, every parameter
//! bound by hand, the id fetched with a scalar execute.

use super::{RowWriter, StrategyKind, Transactional};
use crate::command::Command;
use anyhow::Result;
use crm_core::{Company, Contact};
use rusqlite::Connection;

const INSERT_COMPANY: &str = "INSERT INTO companies (tax_id, name, city) \
                              VALUES (@tax_id, @name, @city); \
                              SELECT last_insert_rowid();";

const INSERT_CONTACT: &str = "INSERT INTO contacts (name, phone, company_id) \
                              VALUES (@name, @phone, @company_id); \
                              SELECT last_insert_rowid();";

#[derive(Debug, Default, Clone, Copy)]
pub struct RawCommandWriter;

pub type RawCommandInserter = Transactional<RawCommandWriter>;

impl RowWriter for RawCommandWriter {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RawCommand
    }

    fn insert_company(&self, conn: &Connection, company: &mut Company) -> Result<i64> {
        let mut cmd = Command::new(conn, INSERT_COMPANY);
        cmd.bind("@tax_id", company.tax_id.clone())
            .bind("@name", company.name.clone())
            .bind("@city", company.city.clone());
        company.id = cmd.execute_scalar_i64()?;
        Ok(company.id)
    }

    fn insert_contact(&self, conn: &Connection, contact: &mut Contact) -> Result<i64> {
        let mut cmd = Command::new(conn, INSERT_CONTACT);
        cmd.bind("@name", contact.name.clone())
            .bind("@phone", contact.phone.clone())
            .bind("@company_id", contact.company_id);
        contact.id = cmd.execute_scalar_i64()?;
        Ok(contact.id)
    }
}
