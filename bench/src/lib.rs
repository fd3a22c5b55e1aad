//! CRM Insert Benchmark
//!
//! Compares five ways of writing "company with contacts" graphs into SQLite:
//! - **tracked**: session with change tracking, one `save_changes` per company
//! - **batched**: bulk insert of 100-company chunks, bypassing the tracker
//! - **direct-sql**: micro-ORM with hand-written SQL, one transaction per batch
//! - **mapped**: micro-ORM inserting through an explicit entity mapping table
//! - **raw-command**: explicit command objects with manually bound parameters
//!
//! Every iteration runs `Setup → Generate → Insert[→ commit | → abort] → Teardown`
//! against its own database file; see [`runner`].
//!
//! Run benchmarks: `cargo bench`
//! Run the standalone report: `cargo run --release`

pub mod command;
pub mod config;
pub mod mapping;
pub mod micro;
pub mod records;
pub mod report;
pub mod runner;
pub mod session;
pub mod store;
pub mod strategy;
