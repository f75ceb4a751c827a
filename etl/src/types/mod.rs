//! Common types shared by the source and the warehouse.
//!
//! Holds the read-only source record types mirroring the operational schema and the computed
//! calendar key used by facts and the date dimension.

mod date_key;
mod source;

pub use date_key::*;
pub use source::*;
