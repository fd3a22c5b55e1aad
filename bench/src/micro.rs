//! Micro-ORM helpers: hand-written SQL, parameters bound by name from the
//! entity's fields. No change tracking and no generated SQL.
//!
//! Inserts hand the new key back through `RETURNING id`, so an insert is a
//! single-row query like any other.

use anyhow::Result;
use crm_core::{Company, Contact};
use rusqlite::{Connection, ToSql};

pub const INSERT_COMPANY_SQL: &str =
    "INSERT INTO companies (tax_id, name, city) VALUES (:tax_id, :name, :city) RETURNING id";

pub const INSERT_CONTACT_SQL: &str = "INSERT INTO contacts (name, phone, company_id) \
                                      VALUES (:name, :phone, :company_id) RETURNING id";

/// Exposes an entity's fields as named SQL parameters.
pub trait BindNamed {
    fn bind_named(&self) -> Vec<(&'static str, &dyn ToSql)>;
}

impl BindNamed for Company {
    fn bind_named(&self) -> Vec<(&'static str, &dyn ToSql)> {
        vec![
            (":tax_id", &self.tax_id),
            (":name", &self.name),
            (":city", &self.city),
        ]
    }
}

impl BindNamed for Contact {
    fn bind_named(&self) -> Vec<(&'static str, &dyn ToSql)> {
        vec![
            (":name", &self.name),
            (":phone", &self.phone),
            (":company_id", &self.company_id),
        ]
    }
}

/// Run a statement bound from `row` that yields exactly one scalar, e.g. an
/// `INSERT ... RETURNING id`.
pub fn query_single<R: BindNamed, T: rusqlite::types::FromSql>(
    conn: &Connection,
    sql: &str,
    row: &R,
) -> Result<T> {
    let mut stmt = conn.prepare_cached(sql)?;
    let params = row.bind_named();
    let value = stmt.query_row(params.as_slice(), |r| r.get(0))?;
    Ok(value)
}
