use std::time::Duration;

use serde::Deserialize;

use crate::shared::ValidationError;

/// Settings that drive a synchronization run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Date dimension generation settings.
    #[serde(default)]
    pub calendar: CalendarConfig,
    /// Width, in seconds, of the window below a table's watermark that is re-scanned on
    /// every incremental run.
    ///
    /// Rows committed on the source with a modification time slightly older than the last
    /// observed maximum are picked up by the overlap and re-applied idempotently.
    #[serde(default = "default_watermark_overlap_secs")]
    pub watermark_overlap_secs: u64,
    /// Largest absolute difference between the source and target revenue totals still
    /// reported as consistent.
    #[serde(default = "default_revenue_tolerance")]
    pub revenue_tolerance: f64,
}

impl SyncConfig {
    /// Default watermark overlap. Zero keeps the extraction predicate strictly above the
    /// stored watermark.
    pub const DEFAULT_WATERMARK_OVERLAP_SECS: u64 = 0;

    /// Default revenue tolerance, absorbing floating point accumulation error only.
    pub const DEFAULT_REVENUE_TOLERANCE: f64 = 0.01;

    /// Returns the watermark overlap as a [`Duration`].
    pub fn watermark_overlap(&self) -> Duration {
        Duration::from_secs(self.watermark_overlap_secs)
    }

    /// Validates the synchronization settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.calendar.validate()?;

        if !(self.revenue_tolerance.is_finite() && self.revenue_tolerance > 0.0) {
            return Err(ValidationError::InvalidFieldValue {
                field: "sync.revenue_tolerance".to_owned(),
                constraint: "must be a finite number greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            calendar: CalendarConfig::default(),
            watermark_overlap_secs: default_watermark_overlap_secs(),
            revenue_tolerance: default_revenue_tolerance(),
        }
    }
}

/// Settings for pre-populating the date dimension.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CalendarConfig {
    /// First generated year, inclusive.
    #[serde(default = "default_calendar_start_year")]
    pub start_year: i32,
    /// Last generated year, inclusive.
    #[serde(default = "default_calendar_end_year")]
    pub end_year: i32,
    /// Number of generated days written and committed together.
    #[serde(default = "default_calendar_batch_size")]
    pub batch_size: usize,
}

impl CalendarConfig {
    /// Default first calendar year.
    pub const DEFAULT_START_YEAR: i32 = 2000;

    /// Default last calendar year.
    pub const DEFAULT_END_YEAR: i32 = 2030;

    /// Default number of days committed per batch.
    pub const DEFAULT_BATCH_SIZE: usize = 1000;

    /// Ensures the year range is ordered and the batch size is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start_year > self.end_year {
            return Err(ValidationError::InvalidCalendarRange {
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }

        if self.batch_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "sync.calendar.batch_size".to_owned(),
                constraint: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start_year: default_calendar_start_year(),
            end_year: default_calendar_end_year(),
            batch_size: default_calendar_batch_size(),
        }
    }
}

fn default_watermark_overlap_secs() -> u64 {
    SyncConfig::DEFAULT_WATERMARK_OVERLAP_SECS
}

fn default_revenue_tolerance() -> f64 {
    SyncConfig::DEFAULT_REVENUE_TOLERANCE
}

fn default_calendar_start_year() -> i32 {
    CalendarConfig::DEFAULT_START_YEAR
}

fn default_calendar_end_year() -> i32 {
    CalendarConfig::DEFAULT_END_YEAR
}

fn default_calendar_batch_size() -> usize {
    CalendarConfig::DEFAULT_BATCH_SIZE
}
