//! Bulk insert extension: writes whole company graphs with multi-row
//! statements, bypassing the change tracker.
//!
//! Keys are allocated up front from the current table maximum, so contacts
//! can reference their parent without a round trip per company. The whole
//! call is one transaction; on failure nothing from it is visible and the
//! graphs get their ids cleared again.

use super::Session;
use crate::mapping::{self, Entity, TableMapping};
use anyhow::{ensure, Result};
use crm_core::{Company, CompanyGraph, Contact};
use rusqlite::Connection;

/// SQLite builds compiled before 3.32 cap a statement at 999 variables.
pub const DEFAULT_MAX_PARAMETERS: usize = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkConfig {
    /// Upper bound of bound variables per multi-row statement.
    pub max_parameters: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_parameters: DEFAULT_MAX_PARAMETERS,
        }
    }
}

impl BulkConfig {
    /// Rows of `mapping` that fit into one statement.
    pub fn rows_per_statement(&self, mapping: &TableMapping) -> usize {
        (self.max_parameters / mapping.bulk_width()).max(1)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BulkOutcome {
    pub companies: usize,
    pub contacts: usize,
}

fn next_id(conn: &Connection, mapping: &TableMapping) -> Result<i64> {
    let sql = format!(
        "SELECT COALESCE(MAX({}), 0) + 1 FROM {}",
        mapping.key, mapping.table
    );
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}

fn assign_ids(graphs: &mut [CompanyGraph], first_company: i64, first_contact: i64) {
    let mut contact_id = first_contact;
    for (company_id, graph) in (first_company..).zip(graphs.iter_mut()) {
        graph.company.id = company_id;
        graph.fix_up_foreign_keys();
        for contact in &mut graph.contacts {
            contact.id = contact_id;
            contact_id += 1;
        }
    }
}

fn clear_ids(graphs: &mut [CompanyGraph]) {
    for graph in graphs {
        graph.company.id = 0;
        for contact in &mut graph.contacts {
            contact.id = 0;
            contact.company_id = 0;
        }
    }
}

fn write_graphs(
    conn: &Connection,
    graphs: &[CompanyGraph],
    config: &BulkConfig,
) -> Result<BulkOutcome> {
    let companies: Vec<&Company> = graphs.iter().map(|g| &g.company).collect();
    let contacts: Vec<&Contact> = graphs.iter().flat_map(|g| g.contacts.iter()).collect();

    let companies_written = mapping::bulk_insert(
        conn,
        &companies,
        config.rows_per_statement(Company::mapping()),
    )?;
    let contacts_written = mapping::bulk_insert(
        conn,
        &contacts,
        config.rows_per_statement(Contact::mapping()),
    )?;

    Ok(BulkOutcome {
        companies: companies_written,
        contacts: contacts_written,
    })
}

impl Session<'_> {
    /// Insert `graphs` in one transaction and write the generated ids back
    /// into them.
    pub fn bulk_insert(
        &mut self,
        graphs: &mut [CompanyGraph],
        config: &BulkConfig,
    ) -> Result<BulkOutcome> {
        ensure!(config.max_parameters > 0, "max_parameters must be positive");
        if graphs.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let conn = self.connection()?;
        let tx = conn.transaction()?;

        let first_company = next_id(&tx, Company::mapping())?;
        let first_contact = next_id(&tx, Contact::mapping())?;
        assign_ids(graphs, first_company, first_contact);

        let outcome = match write_graphs(&tx, graphs, config) {
            Ok(outcome) => outcome,
            Err(err) => {
                drop(tx);
                clear_ids(graphs);
                return Err(err);
            }
        };
        if let Err(err) = tx.commit() {
            clear_ids(graphs);
            return Err(err.into());
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SyntheticRecords;
    use crate::session::SessionFactory;
    use crate::store::{self, StoreTarget};
    use crm_core::fake::Faker;

    fn prepared_target() -> (tempfile::TempDir, StoreTarget) {
        let dir = tempfile::tempdir().unwrap();
        let target = StoreTarget::new(dir.path().join("bulk.db"));
        store::prepare(&target).unwrap();
        (dir, target)
    }

    fn graphs(n: usize, contacts: usize) -> Vec<CompanyGraph> {
        let mut faker = Faker::seeded(8);
        SyntheticRecords::new(&mut faker, n, contacts).collect()
    }

    #[test]
    fn rows_per_statement_respects_parameter_budget() {
        let config = BulkConfig { max_parameters: 10 };
        assert_eq!(config.rows_per_statement(Company::mapping()), 2);
        let tiny = BulkConfig { max_parameters: 1 };
        assert_eq!(tiny.rows_per_statement(Company::mapping()), 1);
    }

    #[test]
    fn inserts_graphs_with_output_identity() {
        let (_dir, target) = prepared_target();
        let factory = SessionFactory::new(&target);
        let mut session = factory.create_session().unwrap();

        let mut batch = graphs(300, 2);
        let outcome = session
            .bulk_insert(&mut batch, &BulkConfig { max_parameters: 40 })
            .unwrap();
        assert_eq!(outcome, BulkOutcome { companies: 300, contacts: 600 });
        assert_eq!(session.tracked_entities(), 0, "bulk path bypasses tracking");

        for graph in &batch {
            assert!(graph.company.id > 0);
            assert!(graph.contacts.iter().all(|c| c.company_id == graph.company.id));
        }

        let conn = store::connect(&target).unwrap();
        assert_eq!(store::counts(&conn).unwrap(), (300, 600));
        assert_eq!(store::orphan_contacts(&conn).unwrap(), 0);
    }

    #[test]
    fn ids_continue_after_existing_rows() {
        let (_dir, target) = prepared_target();
        let factory = SessionFactory::new(&target);
        let mut session = factory.create_session().unwrap();

        let mut first = graphs(5, 1);
        session.bulk_insert(&mut first, &BulkConfig::default()).unwrap();
        let mut second = graphs(5, 1);
        session.bulk_insert(&mut second, &BulkConfig::default()).unwrap();

        assert_eq!(first.last().unwrap().company.id, 5);
        assert_eq!(second.first().unwrap().company.id, 6);
        assert_eq!(second.last().unwrap().contacts[0].id, 10);
    }

    #[test]
    fn failed_chunk_is_rolled_back_and_ids_cleared() {
        let (_dir, target) = prepared_target();
        store::connect(&target)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_late_contacts BEFORE INSERT ON contacts
                 WHEN NEW.id > 3
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let factory = SessionFactory::new(&target);
        let mut session = factory.create_session().unwrap();
        let mut batch = graphs(4, 1);
        assert!(session.bulk_insert(&mut batch, &BulkConfig::default()).is_err());
        assert!(batch.iter().all(|g| g.company.id == 0));

        let conn = store::connect(&target).unwrap();
        assert_eq!(store::counts(&conn).unwrap(), (0, 0));
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let (_dir, target) = prepared_target();
        let factory = SessionFactory::new(&target);
        let mut session = factory.create_session().unwrap();
        let outcome = session.bulk_insert(&mut [], &BulkConfig::default()).unwrap();
        assert_eq!(outcome, BulkOutcome::default());
    }
}
