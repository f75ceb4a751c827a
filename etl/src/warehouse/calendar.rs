use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use etl_config::shared::CalendarConfig;
use metrics::counter;
use sqlx::FromRow;
use tracing::{debug, info};

use crate::error::{ErrorKind, EtlResult};
use crate::metrics::ETL_CALENDAR_DAYS_GENERATED_TOTAL;
use crate::types::DateKey;
use crate::warehouse::Warehouse;
use crate::{bail, etl_error};

/// One row of the date dimension.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CalendarDay {
    pub date_key: DateKey,
    pub date: NaiveDate,
    pub year: i32,
    pub quarter: i32,
    pub month: i32,
    pub day_of_month: i32,
    /// Monday is 0, Sunday is 6.
    pub day_of_week: i32,
    pub is_weekend: bool,
}

impl CalendarDay {
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month() as i32;
        let day_of_week = date.weekday().num_days_from_monday() as i32;

        Self {
            date_key: DateKey::from_date(date),
            date,
            year: date.year(),
            quarter: (month - 1) / 3 + 1,
            month,
            day_of_month: date.day() as i32,
            day_of_week,
            is_weekend: day_of_week >= 5,
        }
    }
}

/// Result of a calendar generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarSummary {
    /// Days inserted by this run.
    pub generated: usize,
    /// Days of the range that were already present.
    pub skipped: usize,
}

/// Inserts one date dimension row per day of `[start_year, end_year]` that is not already
/// present.
///
/// Existing keys are loaded up front. Rows are written in batches of
/// [`CalendarConfig::batch_size`], each committed on its own, so an interrupted run keeps
/// its progress and a rerun only fills the gaps.
pub async fn generate_calendar(
    warehouse: &Warehouse,
    config: &CalendarConfig,
) -> EtlResult<CalendarSummary> {
    if config.start_year > config.end_year {
        bail!(
            ErrorKind::ConfigError,
            "Calendar range is empty",
            format!("{} is after {}", config.start_year, config.end_year)
        );
    }
    if config.batch_size == 0 {
        bail!(ErrorKind::ConfigError, "Calendar batch size must be positive");
    }

    let first_day = NaiveDate::from_ymd_opt(config.start_year, 1, 1).ok_or_else(|| {
        etl_error!(
            ErrorKind::ConfigError,
            "Calendar year out of range",
            config.start_year
        )
    })?;
    let last_day = NaiveDate::from_ymd_opt(config.end_year, 12, 31).ok_or_else(|| {
        etl_error!(
            ErrorKind::ConfigError,
            "Calendar year out of range",
            config.end_year
        )
    })?;

    info!(
        start_year = config.start_year,
        end_year = config.end_year,
        "generating date dimension"
    );

    let existing: HashSet<DateKey> =
        sqlx::query_scalar::<_, DateKey>("select date_key from dim_date")
            .fetch_all(warehouse.pool())
            .await?
            .into_iter()
            .collect();

    let mut summary = CalendarSummary::default();
    let mut batch = Vec::with_capacity(config.batch_size);

    for date in first_day.iter_days().take_while(|date| *date <= last_day) {
        let day = CalendarDay::from_date(date);
        if existing.contains(&day.date_key) {
            summary.skipped += 1;
            continue;
        }

        batch.push(day);
        if batch.len() >= config.batch_size {
            summary.generated += write_batch(warehouse, &batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        summary.generated += write_batch(warehouse, &batch).await?;
    }

    info!(
        generated = summary.generated,
        skipped = summary.skipped,
        "date dimension generation complete"
    );

    Ok(summary)
}

/// Inserts `days` and commits them together.
async fn write_batch(warehouse: &Warehouse, days: &[CalendarDay]) -> EtlResult<usize> {
    let mut tx = warehouse.begin().await?;

    for day in days {
        sqlx::query(
            r#"
            insert into dim_date
                (date_key, date, year, quarter, month, day_of_month, day_of_week, is_weekend)
            values (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(day.date_key)
        .bind(day.date)
        .bind(day.year)
        .bind(day.quarter)
        .bind(day.month)
        .bind(day.day_of_month)
        .bind(day.day_of_week)
        .bind(day.is_weekend)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    counter!(ETL_CALENDAR_DAYS_GENERATED_TOTAL).increment(days.len() as u64);
    debug!(days = days.len(), "committed calendar batch");

    Ok(days.len())
}
