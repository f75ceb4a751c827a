//! Read-only access to the operational database.

mod base;
mod memory;
mod mysql;
mod records;

pub use base::{Source, SourceRecord, SourceTable};
pub use memory::MemorySource;
pub use mysql::MySqlSource;
