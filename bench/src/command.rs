//! Raw parameterized command objects.
//!
//! A [`Command`] holds SQL text that may contain several statements and a
//! list of manually bound parameters. Nothing is cached: each execution
//! prepares every statement again, the way a driver-level command does.

use anyhow::{bail, Result};
use rusqlite::types::Value;
use rusqlite::{Batch, Connection};

pub struct Command<'conn> {
    conn: &'conn Connection,
    sql: String,
    parameters: Vec<(String, Value)>,
}

impl<'conn> Command<'conn> {
    pub fn new(conn: &'conn Connection, sql: impl Into<String>) -> Self {
        Self {
            conn,
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    /// Bind `value` to the parameter called `name` (prefix included, e.g.
    /// `@tax_id`). Rebinding a name replaces the previous value.
    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.parameters.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((name.to_string(), value)),
        }
        self
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Run every statement and return the first column of the first row any
    /// statement produced.
    pub fn execute_scalar(&self) -> Result<Option<Value>> {
        let mut scalar = None;
        self.run(|value| {
            if scalar.is_none() {
                scalar = Some(value);
            }
        })?;
        Ok(scalar)
    }

    /// Like [`Self::execute_scalar`], but the scalar must be an integer.
    pub fn execute_scalar_i64(&self) -> Result<i64> {
        match self.execute_scalar()? {
            Some(Value::Integer(v)) => Ok(v),
            Some(other) => bail!("command returned a non-integer scalar: {other:?}"),
            None => bail!("command returned no rows: {}", self.sql),
        }
    }

    fn run(&self, mut on_first_value: impl FnMut(Value)) -> Result<()> {
        let mut batch = Batch::new(self.conn, &self.sql);
        while let Some(mut stmt) = batch.next()? {
            for index in 1..=stmt.parameter_count() {
                let Some(name) = stmt.parameter_name(index) else {
                    bail!("positional parameter {index} in command text: {}", self.sql);
                };
                let Some((_, value)) = self.parameters.iter().find(|(n, _)| n == name) else {
                    bail!("parameter {name} was not bound");
                };
                stmt.raw_bind_parameter(index, value)?;
            }

            if stmt.column_count() == 0 {
                stmt.raw_execute()?;
                continue;
            }

            let mut rows = stmt.raw_query();
            if let Some(row) = rows.next()? {
                on_first_value(row.get::<_, Value>(0)?);
            }
        }
        Ok(())
    }
}
