//! Fault injection points, compiled in with the `failpoints` feature.

use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, EtlError, EtlResult};

/// Hit after a table's rows and watermark are written but before its unit of work commits.
///
/// When configured with a parameter, the failpoint only fires for the table of that name,
/// e.g. `return(fact_payment)`. Without a parameter it fires for every table.
pub const SYNC_TABLE_BEFORE_COMMIT: &str = "sync_table.before_commit";

/// Evaluates the failpoint `name` for `table`, returning an error when it fires.
pub fn etl_fail_point(name: &str, table: &str) -> EtlResult<()> {
    fail_point!(name, |parameter: Option<String>| {
        if parameter.as_deref().is_none_or(|target| target == table) {
            bail!(
                ErrorKind::FailpointTriggered,
                "An error occurred in a fail point",
                format!("The failpoint '{name}' returned an error for table '{table}'")
            );
        }

        Ok::<(), EtlError>(())
    });

    Ok(())
}
