//! Shared pieces of the CRM insert benchmarks: the company/contact domain
//! model, the pt_BR synthetic data generator and the log4rs setup used by the
//! benchmark binary.

pub mod fake;
pub mod logging;
pub mod types;

pub use logging::{initialize_logger, parse_log_level};
pub use types::{Company, CompanyGraph, Contact};
