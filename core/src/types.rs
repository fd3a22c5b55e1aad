//! Company / contact domain model shared by every insert strategy.
//!
//! Ids are assigned by the store. An entity that has not been persisted yet
//! carries `id == 0`, and a contact's `company_id` stays `0` until its parent
//! company has been written.

/// A company row. Owns its contacts through [`CompanyGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Company {
    pub id: i64,
    /// CNPJ, 14 digits without format symbols.
    pub tax_id: String,
    pub name: String,
    pub city: String,
}

/// A contact row; `company_id` must reference an existing company.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub phone: String,
}

/// In-memory object graph: one company and the contacts it owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyGraph {
    pub company: Company,
    pub contacts: Vec<Contact>,
}

impl CompanyGraph {
    pub fn new(company: Company) -> Self {
        Self {
            company,
            contacts: Vec::new(),
        }
    }

    /// Copy the parent's id into every contact's foreign key.
    pub fn fix_up_foreign_keys(&mut self) {
        let company_id = self.company.id;
        for contact in &mut self.contacts {
            contact.company_id = company_id;
        }
    }
}
