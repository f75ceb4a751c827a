use std::fmt;
use std::marker::PhantomData;

use chrono::NaiveDateTime;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, SqliteConnection};

use crate::error::EtlResult;

/// A dimension or fact table of the star schema, upserted by natural key.
///
/// Every such table has an auto-assigned surrogate key, a unique natural key, the attribute
/// columns listed in [`TargetTable::COLUMNS`] and a `last_update` stamp.
pub trait TargetTable {
    /// Name of the table.
    const NAME: &'static str;

    /// Column holding the surrogate key.
    const SURROGATE_KEY: &'static str;

    /// Column holding the natural key.
    const NATURAL_KEY: &'static str;

    /// Attribute columns, in the order [`TargetTable::bind_columns`] binds them.
    const COLUMNS: &'static [&'static str];

    /// Natural key and attributes of a row, excluding the surrogate key and the stamp.
    type Row: fmt::Debug + Clone + PartialEq + Send + Sync + Unpin + for<'r> FromRow<'r, SqliteRow>;

    /// Returns the natural key of `row`.
    fn natural_key(row: &Self::Row) -> i64;

    /// Binds the attributes of `row` in [`TargetTable::COLUMNS`] order.
    fn bind_columns<'q>(
        row: &Self::Row,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>>;
}

/// Write applied to a single row by an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    /// No row had the natural key. A new surrogate key was assigned.
    Inserted,
    /// The row existed with different attributes, which were overwritten in place.
    Updated,
    /// The row existed with identical attributes and was left untouched.
    Unchanged,
}

impl UpsertAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Statements upserting rows of `T` by natural key.
///
/// The surrogate key of an existing row is never modified.
#[derive(Debug)]
pub struct Upserter<T> {
    select_sql: String,
    update_sql: String,
    insert_sql: String,
    _table: PhantomData<fn() -> T>,
}

impl<T> Upserter<T>
where
    T: TargetTable,
{
    pub fn new() -> Self {
        let attributes = T::COLUMNS.join(", ");
        let assignments = T::COLUMNS
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; T::COLUMNS.len() + 2].join(", ");

        Self {
            select_sql: format!(
                "select {nk}, {attributes} from {table} where {nk} = ?",
                nk = T::NATURAL_KEY,
                table = T::NAME,
            ),
            update_sql: format!(
                "update {table} set {assignments}, last_update = ? where {nk} = ?",
                nk = T::NATURAL_KEY,
                table = T::NAME,
            ),
            insert_sql: format!(
                "insert into {table} ({nk}, {attributes}, last_update) values ({placeholders})",
                nk = T::NATURAL_KEY,
                table = T::NAME,
            ),
            _table: PhantomData,
        }
    }

    /// Inserts `row` or overwrites the attributes of the row sharing its natural key.
    ///
    /// Written rows are stamped with `now`. `reapplied` marks a row already loaded by an
    /// earlier run and read again inside the watermark overlap; when its stored attributes
    /// equal `row` it is not written and keeps its stamp.
    pub async fn upsert(
        &self,
        conn: &mut SqliteConnection,
        row: &T::Row,
        now: NaiveDateTime,
        reapplied: bool,
    ) -> EtlResult<UpsertAction> {
        let natural_key = T::natural_key(row);

        let existing = sqlx::query_as::<_, T::Row>(&self.select_sql)
            .bind(natural_key)
            .fetch_optional(&mut *conn)
            .await?;

        let action = match existing {
            Some(existing) if reapplied && existing == *row => UpsertAction::Unchanged,
            Some(_) => {
                T::bind_columns(row, sqlx::query(&self.update_sql))
                    .bind(now)
                    .bind(natural_key)
                    .execute(&mut *conn)
                    .await?;

                UpsertAction::Updated
            }
            None => {
                let query = sqlx::query(&self.insert_sql).bind(natural_key);
                T::bind_columns(row, query)
                    .bind(now)
                    .execute(&mut *conn)
                    .await?;

                UpsertAction::Inserted
            }
        };

        Ok(action)
    }
}

impl<T> Default for Upserter<T>
where
    T: TargetTable,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::test_utils::warehouse::spawn_warehouse;
    use crate::warehouse::{DimActor, DimActorRow};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2006, 2, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn penelope() -> DimActorRow {
        DimActorRow {
            actor_id: 1,
            first_name: "PENELOPE".to_owned(),
            last_name: "GUINESS".to_owned(),
        }
    }

    async fn stamp(conn: &mut SqliteConnection) -> NaiveDateTime {
        sqlx::query_scalar("select last_update from dim_actor where actor_id = 1")
            .fetch_one(conn)
            .await
            .unwrap()
    }

    #[test]
    fn statements_list_every_attribute_column() {
        let upserter = Upserter::<DimActor>::new();

        assert_eq!(
            upserter.select_sql,
            "select actor_id, first_name, last_name from dim_actor where actor_id = ?"
        );
        assert_eq!(
            upserter.update_sql,
            "update dim_actor set first_name = ?, last_name = ?, last_update = ? where actor_id = ?"
        );
        assert_eq!(
            upserter.insert_sql,
            "insert into dim_actor (actor_id, first_name, last_name, last_update) values (?, ?, ?, ?)"
        );
    }

    #[tokio::test]
    async fn identical_rows_are_only_skipped_when_reapplied() {
        let warehouse = spawn_warehouse().await;
        let mut conn = warehouse.pool().acquire().await.unwrap();
        let upserter = Upserter::<DimActor>::new();

        let inserted = upserter
            .upsert(&mut conn, &penelope(), at(1), false)
            .await
            .unwrap();
        let reapplied = upserter
            .upsert(&mut conn, &penelope(), at(2), true)
            .await
            .unwrap();

        assert_eq!(inserted, UpsertAction::Inserted);
        assert_eq!(reapplied, UpsertAction::Unchanged);
        assert_eq!(stamp(&mut conn).await, at(1));

        let touched = upserter
            .upsert(&mut conn, &penelope(), at(3), false)
            .await
            .unwrap();

        assert_eq!(touched, UpsertAction::Updated);
        assert_eq!(stamp(&mut conn).await, at(3));
    }

    #[tokio::test]
    async fn changed_rows_are_updated_even_when_reapplied() {
        let warehouse = spawn_warehouse().await;
        let mut conn = warehouse.pool().acquire().await.unwrap();
        let upserter = Upserter::<DimActor>::new();
        upserter
            .upsert(&mut conn, &penelope(), at(1), false)
            .await
            .unwrap();

        let renamed = DimActorRow {
            last_name: "CHASE".to_owned(),
            ..penelope()
        };
        let action = upserter
            .upsert(&mut conn, &renamed, at(2), true)
            .await
            .unwrap();

        assert_eq!(action, UpsertAction::Updated);
        assert_eq!(stamp(&mut conn).await, at(2));
    }
}
