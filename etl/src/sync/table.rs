use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use etl_config::shared::SyncConfig;
use metrics::{counter, histogram};
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
#[cfg(feature = "failpoints")]
use crate::failpoints::{SYNC_TABLE_BEFORE_COMMIT, etl_fail_point};
use crate::metrics::{
    ACTION_LABEL, ETL_ROWS_EXTRACTED_TOTAL, ETL_ROWS_WRITTEN_TOTAL,
    ETL_TABLE_SYNC_DURATION_SECONDS, TABLE_NAME_LABEL,
};
use crate::source::{Source, SourceRecord};
use crate::warehouse::{TargetTable, UpsertAction, Upserter, Warehouse, store_watermark};

/// Watermark assumed for a table that was never synchronized.
pub const MINIMUM_WATERMARK: NaiveDateTime = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(date) => date.and_time(NaiveTime::MIN),
    None => NaiveDateTime::MIN,
};

/// Binds a source record type to the star-schema table it is loaded into.
pub trait TableSync: TargetTable {
    /// Source record the rows are derived from.
    type Record: SourceRecord;

    /// Lookup state needed to transform records, loaded once per synchronization.
    type Context: Send;

    /// Loads the context inside the synchronization's unit of work, after the dimensions it
    /// depends on were committed.
    fn prepare(
        conn: &mut SqliteConnection,
    ) -> impl Future<Output = EtlResult<Self::Context>> + Send;

    /// Derives the target row of `record`.
    fn transform(record: &Self::Record, context: &Self::Context) -> EtlResult<Self::Row>;
}

/// Result of synchronizing one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSyncOutcome {
    pub table: &'static str,
    pub extracted: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Watermark stored once the synchronization finished.
    pub watermark: Option<NaiveDateTime>,
}

impl TableSyncOutcome {
    fn new(table: &'static str, watermark: Option<NaiveDateTime>) -> Self {
        Self {
            table,
            extracted: 0,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            watermark,
        }
    }

    fn record(&mut self, action: UpsertAction) {
        match action {
            UpsertAction::Inserted => self.inserted += 1,
            UpsertAction::Updated => self.updated += 1,
            UpsertAction::Unchanged => self.unchanged += 1,
        }
    }

    /// Returns `true` when no row changed since the watermark and nothing was written.
    pub fn is_skipped(&self) -> bool {
        self.extracted == 0
    }
}

impl fmt::Display for TableSyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_skipped() {
            return write!(f, "{}: no changes", self.table);
        }

        write!(
            f,
            "{}: {} extracted, {} inserted, {} updated, {} unchanged",
            self.table, self.extracted, self.inserted, self.updated, self.unchanged
        )
    }
}

/// Returns the exclusive lower bound of the next extraction.
///
/// The bound is the stored watermark moved back by `overlap`, or [`MINIMUM_WATERMARK`] for a
/// table without watermark.
pub fn extraction_lower_bound(
    watermark: Option<NaiveDateTime>,
    overlap: Duration,
) -> EtlResult<NaiveDateTime> {
    let Some(watermark) = watermark else {
        return Ok(MINIMUM_WATERMARK);
    };

    let overlap = TimeDelta::from_std(overlap)
        .map_err(|err| etl_error!(ErrorKind::ConfigError, "Watermark overlap too large", err))?;

    Ok(watermark
        .checked_sub_signed(overlap)
        .unwrap_or(MINIMUM_WATERMARK)
        .max(MINIMUM_WATERMARK))
}

/// Synchronizes the rows of `T` changed since its watermark.
///
/// Reads the watermark, extracts the changed source records and, when there are any, upserts
/// them by natural key and advances the watermark to the largest source timestamp observed.
/// Rows and watermark are committed together. Nothing is written when no record changed.
pub async fn sync_table<T, S>(
    source: &S,
    warehouse: &Warehouse,
    config: &SyncConfig,
) -> EtlResult<TableSyncOutcome>
where
    T: TableSync,
    S: Source,
{
    let started = Instant::now();

    let watermark = warehouse.watermark(T::NAME).await?;
    let since = extraction_lower_bound(watermark, config.watermark_overlap())?;

    info!(table = T::NAME, %since, "starting table sync");

    let records = source.extract_changed::<T::Record>(since).await?;

    counter!(ETL_ROWS_EXTRACTED_TOTAL, TABLE_NAME_LABEL => T::NAME)
        .increment(records.len() as u64);

    let mut outcome = TableSyncOutcome::new(T::NAME, watermark);
    if records.is_empty() {
        info!(table = T::NAME, "no changed rows, watermark left untouched");

        return Ok(outcome);
    }
    outcome.extracted = records.len();

    let mut tx = warehouse.begin().await?;
    let context = T::prepare(&mut tx).await?;

    let upserter = Upserter::<T>::new();
    let now = Utc::now().naive_utc();

    for record in &records {
        let row = T::transform(record, &context)?;
        let reapplied = watermark.is_some_and(|watermark| record.last_update() <= watermark);
        let action = upserter.upsert(&mut tx, &row, now, reapplied).await?;
        outcome.record(action);
    }

    let new_watermark = records
        .iter()
        .map(SourceRecord::last_update)
        .fold(watermark.unwrap_or(since), NaiveDateTime::max);
    store_watermark(&mut tx, T::NAME, new_watermark).await?;

    #[cfg(feature = "failpoints")]
    etl_fail_point(SYNC_TABLE_BEFORE_COMMIT, T::NAME)?;

    tx.commit().await?;
    outcome.watermark = Some(new_watermark);

    for (action, rows) in [
        (UpsertAction::Inserted, outcome.inserted),
        (UpsertAction::Updated, outcome.updated),
        (UpsertAction::Unchanged, outcome.unchanged),
    ] {
        counter!(
            ETL_ROWS_WRITTEN_TOTAL,
            TABLE_NAME_LABEL => T::NAME,
            ACTION_LABEL => action.as_str(),
        )
        .increment(rows as u64);
    }

    histogram!(ETL_TABLE_SYNC_DURATION_SECONDS, TABLE_NAME_LABEL => T::NAME)
        .record(started.elapsed().as_secs_f64());

    info!(
        table = T::NAME,
        extracted = outcome.extracted,
        inserted = outcome.inserted,
        updated = outcome.updated,
        unchanged = outcome.unchanged,
        watermark = %new_watermark,
        "completed table sync"
    );

    Ok(outcome)
}
