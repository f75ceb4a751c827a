//! Shared configuration types for the replicator.

mod base;
mod connection;
mod replicator;
mod sync;

pub use base::ValidationError;
pub use connection::{
    IntoConnectOptions, SourceConnectionConfig, TargetConnectionConfig, TlsConfig,
};
pub use replicator::ReplicatorConfig;
pub use sync::{CalendarConfig, SyncConfig};
