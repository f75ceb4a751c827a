//! Synchronizers moving changed source rows into the star schema.

mod bridges;
mod dimensions;
mod facts;
mod table;

pub use bridges::{BridgeOutcome, BridgeSummary, rebuild_bridges};
pub use dimensions::sync_dimensions;
pub use facts::sync_facts;
pub use table::{
    MINIMUM_WATERMARK, TableSync, TableSyncOutcome, extraction_lower_bound, sync_table,
};
