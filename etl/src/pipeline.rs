use std::fmt;
use std::time::Instant;

use etl_config::shared::{CalendarConfig, SyncConfig};
use metrics::{counter, histogram};
use tracing::{error, info};

use crate::error::EtlResult;
use crate::metrics::{
    ETL_RELOAD_DURATION_SECONDS, ETL_RELOAD_FAILURES_TOTAL, MODE_LABEL, register_metrics,
};
use crate::source::Source;
use crate::sync::{BridgeSummary, TableSyncOutcome, rebuild_bridges, sync_dimensions, sync_facts};
use crate::validation::{ValidationReport, validate};
use crate::warehouse::{CalendarSummary, Warehouse, generate_calendar};

/// How a reload treats the rows already in the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMode {
    /// Clears every table and watermark, then loads the full source history.
    Full,
    /// Loads only the rows changed since each table's watermark.
    Incremental,
}

impl ReloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

impl fmt::Display for ReloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a completed reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadSummary {
    pub mode: ReloadMode,
    pub dimensions: Vec<TableSyncOutcome>,
    pub facts: Vec<TableSyncOutcome>,
    pub bridges: BridgeSummary,
}

impl ReloadSummary {
    /// Returns the outcome of every synchronized table, dimensions first.
    pub fn tables(&self) -> impl Iterator<Item = &TableSyncOutcome> {
        self.dimensions.iter().chain(self.facts.iter())
    }
}

impl fmt::Display for ReloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} reload completed", self.mode)?;
        for outcome in self.tables() {
            writeln!(f, "  {outcome}")?;
        }
        write!(f, "  {}", self.bridges)
    }
}

/// Creates the star schema in `warehouse` and fills its date dimension. Safe to repeat.
///
/// Touches only the warehouse, so it runs before any source is reachable.
pub async fn initialize_warehouse(
    warehouse: &Warehouse,
    calendar: &CalendarConfig,
) -> EtlResult<CalendarSummary> {
    info!("initializing warehouse");

    warehouse.migrate().await?;
    let summary = generate_calendar(warehouse, calendar).await?;

    info!(
        generated = summary.generated,
        skipped = summary.skipped,
        "warehouse initialized"
    );

    Ok(summary)
}

/// Runs the synchronization steps against one source and one warehouse.
///
/// Steps run strictly one after another: dimensions, then facts, then bridges. Every table
/// commits its own unit of work, so a failing step leaves the steps before it committed and a
/// rerun of the incremental reload resumes from the stored watermarks.
#[derive(Debug)]
pub struct Pipeline<S> {
    source: S,
    warehouse: Warehouse,
    config: SyncConfig,
}

impl<S> Pipeline<S>
where
    S: Source,
{
    pub fn new(source: S, warehouse: Warehouse, config: SyncConfig) -> Self {
        register_metrics();

        Self {
            source,
            warehouse,
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    /// Creates the star schema and fills the date dimension. Safe to repeat.
    pub async fn initialize(&self) -> EtlResult<CalendarSummary> {
        initialize_warehouse(&self.warehouse, &self.config.calendar).await
    }

    /// Clears the warehouse, keeping the date dimension, and reloads everything from the source.
    pub async fn full_reload(&self) -> EtlResult<ReloadSummary> {
        self.run(ReloadMode::Full).await
    }

    /// Loads the source changes since the last run.
    pub async fn incremental_reload(&self) -> EtlResult<ReloadSummary> {
        self.run(ReloadMode::Incremental).await
    }

    /// Compares the warehouse with the source.
    pub async fn validate(&self) -> EtlResult<ValidationReport> {
        validate(&self.source, &self.warehouse, self.config.revenue_tolerance).await
    }

    async fn run(&self, mode: ReloadMode) -> EtlResult<ReloadSummary> {
        let started = Instant::now();
        info!(%mode, "starting reload");

        let result = self.reload(mode).await;

        histogram!(ETL_RELOAD_DURATION_SECONDS, MODE_LABEL => mode.as_str())
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(_) => info!(%mode, "reload completed"),
            Err(err) => {
                counter!(ETL_RELOAD_FAILURES_TOTAL, MODE_LABEL => mode.as_str()).increment(1);
                error!(%mode, error = %err, "reload aborted");
            }
        }

        result
    }

    async fn reload(&self, mode: ReloadMode) -> EtlResult<ReloadSummary> {
        if mode == ReloadMode::Full {
            self.warehouse.clear().await?;
        }

        let dimensions = sync_dimensions(&self.source, &self.warehouse, &self.config).await?;
        let facts = sync_facts(&self.source, &self.warehouse, &self.config).await?;
        let bridges = rebuild_bridges(&self.source, &self.warehouse).await?;

        Ok(ReloadSummary {
            mode,
            dimensions,
            facts,
            bridges,
        })
    }
}
