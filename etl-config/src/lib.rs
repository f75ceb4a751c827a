//! Configuration for the star-schema replicator.
//!
//! Holds the serde types describing the source and target stores and the synchronization
//! settings, plus the hierarchical loader that merges files and environment overrides.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
