//! Metric names recorded during synchronization runs.
//!
//! Values go through the `metrics` facade and are discarded unless the embedding process
//! installs a recorder.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

/// Label for the target table name in metrics.
pub const TABLE_NAME_LABEL: &str = "table_name";

/// Label for the kind of write applied to a row.
pub const ACTION_LABEL: &str = "action";

/// Label for the validated entity.
pub const CHECK_LABEL: &str = "check";

/// Label for the reload mode of a run.
pub const MODE_LABEL: &str = "mode";

/// Counter for rows extracted from the source.
pub const ETL_ROWS_EXTRACTED_TOTAL: &str = "etl_rows_extracted_total";

/// Counter for rows applied to the warehouse, labelled by [`ACTION_LABEL`].
pub const ETL_ROWS_WRITTEN_TOTAL: &str = "etl_rows_written_total";

/// Histogram for the duration of a single table synchronization, in seconds.
pub const ETL_TABLE_SYNC_DURATION_SECONDS: &str = "etl_table_sync_duration_seconds";

/// Counter for bridge links loaded into the warehouse.
pub const ETL_BRIDGE_LINKS_LOADED_TOTAL: &str = "etl_bridge_links_loaded_total";

/// Counter for bridge links dropped because an endpoint was not resolvable.
pub const ETL_BRIDGE_LINKS_DROPPED_TOTAL: &str = "etl_bridge_links_dropped_total";

/// Counter for calendar days inserted into the date dimension.
pub const ETL_CALENDAR_DAYS_GENERATED_TOTAL: &str = "etl_calendar_days_generated_total";

/// Counter for consistency checks that did not pass.
pub const ETL_VALIDATION_FAILURES_TOTAL: &str = "etl_validation_failures_total";

/// Histogram for the duration of a full or incremental reload, in seconds.
pub const ETL_RELOAD_DURATION_SECONDS: &str = "etl_reload_duration_seconds";

/// Counter for reloads that aborted with an error.
pub const ETL_RELOAD_FAILURES_TOTAL: &str = "etl_reload_failures_total";

/// Registers descriptions of every metric emitted by the engine. Only the first call has an
/// effect.
pub(crate) fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            ETL_ROWS_EXTRACTED_TOTAL,
            Unit::Count,
            "Rows read from the source since the table watermark"
        );
        describe_counter!(
            ETL_ROWS_WRITTEN_TOTAL,
            Unit::Count,
            "Rows applied to the warehouse, by upsert action"
        );
        describe_histogram!(
            ETL_TABLE_SYNC_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of a single table synchronization"
        );
        describe_counter!(
            ETL_BRIDGE_LINKS_LOADED_TOTAL,
            Unit::Count,
            "Bridge links written during a rebuild"
        );
        describe_counter!(
            ETL_BRIDGE_LINKS_DROPPED_TOTAL,
            Unit::Count,
            "Bridge links skipped because an endpoint is not in the warehouse"
        );
        describe_counter!(
            ETL_CALENDAR_DAYS_GENERATED_TOTAL,
            Unit::Count,
            "Days inserted into the date dimension"
        );
        describe_counter!(
            ETL_VALIDATION_FAILURES_TOTAL,
            Unit::Count,
            "Consistency checks that did not pass"
        );
        describe_histogram!(
            ETL_RELOAD_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of a full or incremental reload"
        );
        describe_counter!(
            ETL_RELOAD_FAILURES_TOTAL,
            Unit::Count,
            "Reloads aborted by an error"
        );
    });
}
