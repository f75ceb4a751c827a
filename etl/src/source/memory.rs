use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::etl_error;
use crate::source::{Source, SourceRecord, SourceTable};
use crate::types::{FilmActorLink, FilmCategoryLink, SourcePayment};

/// Type-erased rows of one source table, keyed by natural key.
trait RowSet: Send + Sync {
    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<R> RowSet for BTreeMap<i64, R>
where
    R: SourceRecord,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Inner state of [`MemorySource`].
#[derive(Default)]
struct Inner {
    tables: HashMap<SourceTable, Box<dyn RowSet>>,
    film_actor_links: Vec<FilmActorLink>,
    film_category_links: Vec<FilmCategoryLink>,
    /// Tables whose reads fail with [`ErrorKind::SourceQueryFailed`].
    failing_tables: HashSet<SourceTable>,
}

impl Inner {
    fn rows<R>(&self) -> Option<&BTreeMap<i64, R>>
    where
        R: SourceRecord,
    {
        self.tables
            .get(&R::TABLE)
            .and_then(|rows| rows.as_any().downcast_ref::<BTreeMap<i64, R>>())
    }

    fn check_available(&self, table: SourceTable) -> EtlResult<()> {
        if self.failing_tables.contains(&table) {
            return Err(etl_error!(
                ErrorKind::SourceQueryFailed,
                "Source query failed",
                format!("reads from table '{table}' are configured to fail")
            ));
        }

        Ok(())
    }
}

/// In-memory [`Source`] holding typed rows.
///
/// Rows are keyed by natural key, so writing a row whose key already exists replaces it the
/// way an update on the operational database would. Reads of individual tables can be made to
/// fail to exercise error paths.
#[derive(Clone, Default)]
pub struct MemorySource {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record`, replacing any row with the same natural key.
    pub async fn upsert<R>(&self, record: R)
    where
        R: SourceRecord,
    {
        let mut inner = self.inner.lock().await;

        let rows = inner
            .tables
            .entry(R::TABLE)
            .or_insert_with(|| Box::new(BTreeMap::<i64, R>::new()) as Box<dyn RowSet>);

        if let Some(rows) = rows.as_any_mut().downcast_mut::<BTreeMap<i64, R>>() {
            rows.insert(record.natural_key(), record);
        }
    }

    /// Inserts every record of `records`, replacing rows with the same natural key.
    pub async fn upsert_all<R, I>(&self, records: I)
    where
        R: SourceRecord,
        I: IntoIterator<Item = R>,
    {
        for record in records {
            self.upsert(record).await;
        }
    }

    /// Returns the row of type `R` with natural key `key`, if any.
    pub async fn get<R>(&self, key: i64) -> Option<R>
    where
        R: SourceRecord,
    {
        let inner = self.inner.lock().await;

        inner.rows::<R>().and_then(|rows| rows.get(&key).cloned())
    }

    /// Adds a film to actor association unless it is already present.
    pub async fn add_film_actor(&self, link: FilmActorLink) {
        let mut inner = self.inner.lock().await;

        if !inner.film_actor_links.contains(&link) {
            inner.film_actor_links.push(link);
        }
    }

    /// Adds a film to category association unless it is already present.
    pub async fn add_film_category(&self, link: FilmCategoryLink) {
        let mut inner = self.inner.lock().await;

        if !inner.film_category_links.contains(&link) {
            inner.film_category_links.push(link);
        }
    }

    /// Removes a film to actor association.
    pub async fn remove_film_actor(&self, link: FilmActorLink) {
        let mut inner = self.inner.lock().await;

        inner.film_actor_links.retain(|existing| *existing != link);
    }

    /// Makes every subsequent read of `table` fail.
    pub async fn fail_reads(&self, table: SourceTable) {
        let mut inner = self.inner.lock().await;

        inner.failing_tables.insert(table);
    }

    /// Restores reads of every table.
    pub async fn restore_reads(&self) {
        let mut inner = self.inner.lock().await;

        inner.failing_tables.clear();
    }
}

impl Source for MemorySource {
    async fn extract_changed<R>(&self, since: NaiveDateTime) -> EtlResult<Vec<R>>
    where
        R: SourceRecord,
    {
        let inner = self.inner.lock().await;
        inner.check_available(R::TABLE)?;

        let Some(rows) = inner.rows::<R>() else {
            return Ok(Vec::new());
        };

        Ok(rows
            .values()
            .filter(|row| row.last_update() > since)
            .cloned()
            .collect())
    }

    async fn film_actor_links(&self) -> EtlResult<Vec<FilmActorLink>> {
        let inner = self.inner.lock().await;
        inner.check_available(SourceTable::FilmActor)?;

        Ok(inner.film_actor_links.clone())
    }

    async fn film_category_links(&self) -> EtlResult<Vec<FilmCategoryLink>> {
        let inner = self.inner.lock().await;
        inner.check_available(SourceTable::FilmCategory)?;

        Ok(inner.film_category_links.clone())
    }

    async fn count_rows(&self, table: SourceTable) -> EtlResult<i64> {
        let inner = self.inner.lock().await;
        inner.check_available(table)?;

        let count = match table {
            SourceTable::FilmActor => inner.film_actor_links.len(),
            SourceTable::FilmCategory => inner.film_category_links.len(),
            _ => inner.tables.get(&table).map_or(0, |rows| rows.len()),
        };

        Ok(i64::try_from(count)?)
    }

    async fn total_revenue(&self) -> EtlResult<f64> {
        let inner = self.inner.lock().await;
        inner.check_available(SourceTable::Payment)?;

        let total: BigDecimal = inner
            .rows::<SourcePayment>()
            .map(|rows| rows.values().map(|payment| &payment.amount).sum())
            .unwrap_or_default();

        total.to_f64().ok_or_else(|| {
            EtlError::from((
                ErrorKind::ConversionError,
                "Revenue does not fit a float",
                total.to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::SourceActor;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2006, 2, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn actor(actor_id: i64, last_name: &str, hour: u32) -> SourceActor {
        SourceActor {
            actor_id,
            first_name: "PENELOPE".to_owned(),
            last_name: last_name.to_owned(),
            last_update: at(hour),
        }
    }

    #[tokio::test]
    async fn extraction_is_strictly_after_the_bound() {
        let source = MemorySource::new();
        source
            .upsert_all([actor(1, "GUINESS", 4), actor(2, "WAHLBERG", 5)])
            .await;

        let changed: Vec<SourceActor> = source.extract_changed(at(4)).await.unwrap();

        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].actor_id, 2);
    }

    #[tokio::test]
    async fn upsert_replaces_rows_with_the_same_natural_key() {
        let source = MemorySource::new();
        source.upsert(actor(1, "GUINESS", 4)).await;
        source.upsert(actor(1, "CHASE", 6)).await;

        let stored: SourceActor = source.get(1).await.unwrap();

        assert_eq!(stored.last_name, "CHASE");
        assert_eq!(source.count_rows(SourceTable::Actor).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failing_reads_return_source_errors() {
        let source = MemorySource::new();
        source.upsert(actor(1, "GUINESS", 4)).await;
        source.fail_reads(SourceTable::Actor).await;

        let err = source
            .extract_changed::<SourceActor>(at(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);

        source.restore_reads().await;
        assert!(source.extract_changed::<SourceActor>(at(0)).await.is_ok());
    }

    #[tokio::test]
    async fn empty_tables_count_zero_and_have_no_revenue() {
        let source = MemorySource::new();

        assert_eq!(source.count_rows(SourceTable::Film).await.unwrap(), 0);
        assert_eq!(source.total_revenue().await.unwrap(), 0.0);
    }
}
