//! Incremental synchronization of the sakila operational database into a SQLite star schema.
//!
//! A [`pipeline::Pipeline`] reads changed rows from a [`source::Source`], upserts them into
//! the dimensions and facts of a [`warehouse::Warehouse`] by natural key, rebuilds the bridge
//! tables and tracks a per-table watermark so the next run only reads what changed.

mod macros;

pub mod error;
#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod sync;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod validation;
pub mod warehouse;
