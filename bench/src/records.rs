//! The Generate step: lazily builds company graphs from a pt_BR [`Faker`].
//!
//! Graphs are produced on demand while a strategy consumes them, so data
//! generation runs inside the timed window exactly where the strategy asks
//! for the next record.

use crm_core::fake::Faker;
use crm_core::{Company, CompanyGraph, Contact};

/// Iterator over `record_count` unsaved company graphs with
/// `contacts_per_company` contacts each.
pub struct SyntheticRecords<'f> {
    faker: &'f mut Faker,
    remaining: usize,
    contacts_per_company: usize,
}

impl<'f> SyntheticRecords<'f> {
    pub fn new(faker: &'f mut Faker, record_count: usize, contacts_per_company: usize) -> Self {
        Self {
            faker,
            remaining: record_count,
            contacts_per_company,
        }
    }
}

impl Iterator for SyntheticRecords<'_> {
    type Item = CompanyGraph;

    fn next(&mut self) -> Option<CompanyGraph> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let company = Company {
            id: 0,
            name: self.faker.company_name(),
            tax_id: self.faker.cnpj(),
            city: self.faker.city(),
        };
        let contacts = (0..self.contacts_per_company)
            .map(|_| Contact {
                id: 0,
                company_id: 0,
                name: self.faker.full_name(),
                phone: self.faker.phone_number(),
            })
            .collect();

        Some(CompanyGraph { company, contacts })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SyntheticRecords<'_> {}
