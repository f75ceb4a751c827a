//! Consistency checks between the source and the star schema.

use std::fmt;

use metrics::counter;
use tracing::{info, warn};

use crate::error::EtlResult;
use crate::metrics::{CHECK_LABEL, ETL_VALIDATION_FAILURES_TOTAL};
use crate::source::{Source, SourceTable};
use crate::warehouse::{
    DimActor, DimCategory, DimCustomer, DimFilm, DimStore, FactPayment, FactRental,
    TargetTable, Warehouse,
};

/// Width of the rule framing the rendered report.
const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// Entities whose row counts are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedEntity {
    Films,
    Customers,
    Stores,
    Actors,
    Categories,
    Rentals,
    Payments,
}

impl ValidatedEntity {
    pub const ALL: [Self; 7] = [
        Self::Films,
        Self::Customers,
        Self::Stores,
        Self::Actors,
        Self::Categories,
        Self::Rentals,
        Self::Payments,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Films => "Films",
            Self::Customers => "Customers",
            Self::Stores => "Stores",
            Self::Actors => "Actors",
            Self::Categories => "Categories",
            Self::Rentals => "Rentals",
            Self::Payments => "Payments",
        }
    }

    pub fn source_table(&self) -> SourceTable {
        match self {
            Self::Films => SourceTable::Film,
            Self::Customers => SourceTable::Customer,
            Self::Stores => SourceTable::Store,
            Self::Actors => SourceTable::Actor,
            Self::Categories => SourceTable::Category,
            Self::Rentals => SourceTable::Rental,
            Self::Payments => SourceTable::Payment,
        }
    }

    pub fn target_table(&self) -> &'static str {
        match self {
            Self::Films => DimFilm::NAME,
            Self::Customers => DimCustomer::NAME,
            Self::Stores => DimStore::NAME,
            Self::Actors => DimActor::NAME,
            Self::Categories => DimCategory::NAME,
            Self::Rentals => FactRental::NAME,
            Self::Payments => FactPayment::NAME,
        }
    }
}

/// Row counts of one entity on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountCheck {
    pub entity: ValidatedEntity,
    pub source: i64,
    pub target: i64,
}

impl CountCheck {
    pub fn status(&self) -> CheckStatus {
        if self.source == self.target {
            CheckStatus::Ok
        } else {
            CheckStatus::Fail
        }
    }
}

/// Total payment amount on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueCheck {
    pub source: f64,
    pub target: f64,
    /// Largest difference still reported as consistent, exclusive.
    pub tolerance: f64,
}

impl RevenueCheck {
    pub fn status(&self) -> CheckStatus {
        if (self.source - self.target).abs() < self.tolerance {
            CheckStatus::Ok
        } else {
            CheckStatus::Fail
        }
    }
}

/// Outcome of every consistency check of a validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub counts: Vec<CountCheck>,
    pub revenue: RevenueCheck,
}

impl ValidationReport {
    /// Number of checks that did not pass.
    pub fn failures(&self) -> usize {
        let count_failures = self
            .counts
            .iter()
            .filter(|check| check.status() == CheckStatus::Fail)
            .count();
        let revenue_failure = usize::from(self.revenue.status() == CheckStatus::Fail);

        count_failures + revenue_failure
    }

    /// Returns `true` when every check passed.
    pub fn is_ok(&self) -> bool {
        self.failures() == 0
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);

        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "{:<20} | {:<10} | {:<10} | {:<10}",
            "Table / Metric", "Source", "Target", "Status"
        )?;
        writeln!(f, "{rule}")?;

        for check in &self.counts {
            writeln!(
                f,
                "{:<20} | {:<10} | {:<10} | {:<10}",
                check.entity.label(),
                check.source,
                check.target,
                check.status().to_string()
            )?;
        }

        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "{:<20} | {:<10.2} | {:<10.2} | {:<10}",
            "Total Revenue",
            self.revenue.source,
            self.revenue.target,
            self.revenue.status().to_string()
        )?;
        writeln!(f, "{rule}")?;

        if self.is_ok() {
            write!(f, "Validation PASSED: all data matches.")
        } else {
            write!(
                f,
                "Validation FAILED: {} inconsistencies found.",
                self.failures()
            )
        }
    }
}

/// Compares row counts of every dimension and fact and the total revenue between `source`
/// and `warehouse`.
///
/// Read-only. Mismatches are reported in the returned report, never as errors, and every check
/// runs regardless of earlier mismatches.
pub async fn validate<S>(
    source: &S,
    warehouse: &Warehouse,
    revenue_tolerance: f64,
) -> EtlResult<ValidationReport>
where
    S: Source,
{
    info!("validating warehouse against source");

    let mut counts = Vec::with_capacity(ValidatedEntity::ALL.len());
    for entity in ValidatedEntity::ALL {
        let check = CountCheck {
            entity,
            source: source.count_rows(entity.source_table()).await?,
            target: warehouse.count_rows(entity.target_table()).await?,
        };

        if check.status() == CheckStatus::Fail {
            counter!(ETL_VALIDATION_FAILURES_TOTAL, CHECK_LABEL => entity.label()).increment(1);
            warn!(
                check = entity.label(),
                source = check.source,
                target = check.target,
                "row counts differ"
            );
        }

        counts.push(check);
    }

    let revenue = RevenueCheck {
        source: source.total_revenue().await?,
        target: warehouse.total_revenue().await?,
        tolerance: revenue_tolerance,
    };

    if revenue.status() == CheckStatus::Fail {
        counter!(ETL_VALIDATION_FAILURES_TOTAL, CHECK_LABEL => "revenue").increment(1);
        warn!(
            source = revenue.source,
            target = revenue.target,
            "total revenue differs"
        );
    }

    let report = ValidationReport { counts, revenue };
    info!(failures = report.failures(), "validation complete");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(film_target: i64, revenue_target: f64) -> ValidationReport {
        ValidationReport {
            counts: vec![
                CountCheck {
                    entity: ValidatedEntity::Films,
                    source: 1000,
                    target: film_target,
                },
                CountCheck {
                    entity: ValidatedEntity::Payments,
                    source: 16049,
                    target: 16049,
                },
            ],
            revenue: RevenueCheck {
                source: 67416.51,
                target: revenue_target,
                tolerance: 0.01,
            },
        }
    }

    #[test]
    fn matching_report_passes() {
        let report = report(1000, 67416.51);

        assert!(report.is_ok());
        assert!(report.to_string().ends_with("Validation PASSED: all data matches."));
    }

    #[test]
    fn every_mismatch_is_counted() {
        let report = report(999, 67416.00);

        assert_eq!(report.failures(), 2);
        assert_eq!(report.counts[0].status(), CheckStatus::Fail);
        assert_eq!(report.counts[1].status(), CheckStatus::Ok);
        assert!(report.to_string().contains("2 inconsistencies found"));
    }

    #[test]
    fn revenue_within_tolerance_passes() {
        let check = RevenueCheck {
            source: 10.0,
            target: 10.0 + 0.005,
            tolerance: 0.01,
        };

        assert_eq!(check.status(), CheckStatus::Ok);
    }

    #[test]
    fn rendered_rows_are_aligned() {
        let rendered = report(1000, 67416.51).to_string();

        assert!(rendered.contains("Films                | 1000       | 1000       | OK"));
        assert!(rendered.contains("Total Revenue        | 67416.51   | 67416.51   | OK"));
    }
}
