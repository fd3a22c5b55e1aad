//! Explicit entity-to-table mapping.
//!
//! Each mapped type names its table, key column and ordered column list in a
//! static [`TableMapping`]; generic [`insert`] and [`bulk_insert`] derive their
//! SQL from it. The single-row INSERT text is built once per mapping and then
//! served from the statement cache of the connection.

use anyhow::{ensure, Result};
use crm_core::{Company, Contact};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::OnceLock;

/// Table name, key column and non-key columns of one entity type.
#[derive(Debug)]
pub struct TableMapping {
    pub table: &'static str,
    pub key: &'static str,
    /// Non-key columns, in the order [`Entity::values`] yields them.
    pub columns: &'static [&'static str],
    insert_sql: OnceLock<String>,
}

impl TableMapping {
    pub const fn new(
        table: &'static str,
        key: &'static str,
        columns: &'static [&'static str],
    ) -> Self {
        Self {
            table,
            key,
            columns,
            insert_sql: OnceLock::new(),
        }
    }

    /// `INSERT INTO t (c1, c2) VALUES (?1, ?2)`; the key is store-assigned.
    pub fn insert_sql(&self) -> &str {
        self.insert_sql.get_or_init(|| {
            let placeholders: Vec<String> =
                (1..=self.columns.len()).map(|i| format!("?{i}")).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                self.columns.join(", "),
                placeholders.join(", ")
            )
        })
    }

    /// Multi-row insert with explicit keys:
    /// `INSERT INTO t (key, c1, c2) VALUES (?, ?, ?), (?, ?, ?)`.
    pub fn bulk_insert_sql(&self, rows: usize) -> String {
        let width = self.columns.len() + 1;
        let row = format!("({})", vec!["?"; width].join(", "));
        format!(
            "INSERT INTO {} ({}, {}) VALUES {}",
            self.table,
            self.key,
            self.columns.join(", "),
            vec![row; rows].join(", ")
        )
    }

    /// Bound parameters per row in [`Self::bulk_insert_sql`].
    pub fn bulk_width(&self) -> usize {
        self.columns.len() + 1
    }
}

pub static COMPANY_MAPPING: TableMapping =
    TableMapping::new("companies", "id", &["tax_id", "name", "city"]);

pub static CONTACT_MAPPING: TableMapping =
    TableMapping::new("contacts", "id", &["company_id", "name", "phone"]);

/// A type persisted through a [`TableMapping`].
pub trait Entity {
    fn mapping() -> &'static TableMapping;
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    /// Column values in [`TableMapping::columns`] order.
    fn values(&self) -> Vec<Value>;
}

impl Entity for Company {
    fn mapping() -> &'static TableMapping {
        &COMPANY_MAPPING
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.tax_id.clone()),
            Value::Text(self.name.clone()),
            Value::Text(self.city.clone()),
        ]
    }
}

impl Entity for Contact {
    fn mapping() -> &'static TableMapping {
        &CONTACT_MAPPING
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.company_id),
            Value::Text(self.name.clone()),
            Value::Text(self.phone.clone()),
        ]
    }
}

/// Insert one entity through `mapping` and write the generated key back.
pub fn insert_with<E: Entity>(
    conn: &Connection,
    mapping: &TableMapping,
    entity: &mut E,
) -> Result<i64> {
    let mut stmt = conn.prepare_cached(mapping.insert_sql())?;
    stmt.execute(params_from_iter(entity.values()))?;
    let id = conn.last_insert_rowid();
    entity.set_id(id);
    Ok(id)
}

/// Insert one entity through its own mapping.
pub fn insert<E: Entity>(conn: &Connection, entity: &mut E) -> Result<i64> {
    insert_with(conn, E::mapping(), entity)
}

/// Insert entities whose keys are already assigned, `rows_per_statement` rows
/// per multi-row statement.
pub fn bulk_insert<E: Entity>(
    conn: &Connection,
    entities: &[&E],
    rows_per_statement: usize,
) -> Result<usize> {
    ensure!(rows_per_statement > 0, "rows_per_statement must be positive");
    let mapping = E::mapping();
    let mut written = 0;

    for chunk in entities.chunks(rows_per_statement) {
        let mut params = Vec::with_capacity(chunk.len() * mapping.bulk_width());
        for entity in chunk {
            params.push(Value::Integer(entity.id()));
            params.extend(entity.values());
        }
        let mut stmt = conn.prepare_cached(&mapping.bulk_insert_sql(chunk.len()))?;
        written += stmt.execute(params_from_iter(params))?;
    }

    Ok(written)
}
