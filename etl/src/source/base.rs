use std::fmt;
use std::future::Future;

use chrono::NaiveDateTime;
use sqlx::FromRow;
use sqlx::mysql::MySqlRow;

use crate::error::EtlResult;
use crate::types::{FilmActorLink, FilmCategoryLink};

/// Tables of the operational schema the pipeline reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceTable {
    Film,
    Customer,
    Store,
    Actor,
    Category,
    Rental,
    Payment,
    FilmActor,
    FilmCategory,
}

impl SourceTable {
    /// Returns the name of the table in the source database.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Film => "film",
            Self::Customer => "customer",
            Self::Store => "store",
            Self::Actor => "actor",
            Self::Category => "category",
            Self::Rental => "rental",
            Self::Payment => "payment",
            Self::FilmActor => "film_actor",
            Self::FilmCategory => "film_category",
        }
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed row extracted from a table that carries a last-modified timestamp.
///
/// Each record type declares the query selecting its rows, including any joins needed for
/// denormalized attributes. Only the driving table's timestamp decides whether a row changed.
pub trait SourceRecord:
    Clone + Send + Sync + Unpin + 'static + for<'r> FromRow<'r, MySqlRow>
{
    /// Driving table of the record.
    const TABLE: SourceTable;

    /// Query returning every row whose driving table `last_update` is strictly greater than
    /// its single bound parameter.
    const CHANGED_SINCE_QUERY: &'static str;

    /// Identifier of the row in the source system.
    fn natural_key(&self) -> i64;

    /// Last-modified timestamp of the driving row.
    fn last_update(&self) -> NaiveDateTime;
}

/// Read-only operations the pipeline needs from the operational database.
///
/// Implementations never mutate the source.
pub trait Source {
    /// Returns every record of type `R` modified strictly after `since`, ordered by natural
    /// key.
    fn extract_changed<R>(
        &self,
        since: NaiveDateTime,
    ) -> impl Future<Output = EtlResult<Vec<R>>> + Send
    where
        R: SourceRecord;

    /// Returns the full film to actor association set.
    fn film_actor_links(&self) -> impl Future<Output = EtlResult<Vec<FilmActorLink>>> + Send;

    /// Returns the full film to category association set.
    fn film_category_links(
        &self,
    ) -> impl Future<Output = EtlResult<Vec<FilmCategoryLink>>> + Send;

    /// Counts every row of `table`.
    fn count_rows(&self, table: SourceTable) -> impl Future<Output = EtlResult<i64>> + Send;

    /// Sums every payment amount, returning zero when there are no payments.
    fn total_revenue(&self) -> impl Future<Output = EtlResult<f64>> + Send;
}
