//! Access to the SQLite analytical store holding the star schema.

mod bridge;
mod calendar;
mod key_map;
mod state;
mod table;
mod tables;

pub use bridge::BridgeTable;
pub use calendar::{CalendarDay, CalendarSummary, generate_calendar};
pub use key_map::KeyMap;
pub use table::{TargetTable, UpsertAction, Upserter};
pub use tables::*;

pub(crate) use bridge::{clear_bridges, insert_bridge_rows};
pub(crate) use state::{clear_watermarks, load_watermark, store_watermark};

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use etl_config::shared::{IntoConnectOptions, TargetConnectionConfig};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::error::EtlResult;

/// Tables cleared by a full reload, in deletion order.
///
/// Bridges go first and facts precede dimensions so no foreign key is ever left dangling.
const RELOAD_DELETION_ORDER: &[&str] = &[
    BridgeTable::FilmActor.name(),
    BridgeTable::FilmCategory.name(),
    FactRental::NAME,
    FactPayment::NAME,
    DimStore::NAME,
    DimCustomer::NAME,
    DimFilm::NAME,
    DimActor::NAME,
    DimCategory::NAME,
];

/// Handle to the analytical store.
///
/// Wraps a single-connection pool: SQLite serializes writers and the pipeline runs every unit
/// of work sequentially.
#[derive(Debug, Clone)]
pub struct Warehouse {
    pool: SqlitePool,
}

impl Warehouse {
    /// Opens the store described by `config`, creating the database file when missing.
    pub async fn connect(config: &TargetConnectionConfig) -> EtlResult<Self> {
        let options: SqliteConnectOptions = config.with_db();

        let warehouse = Self::connect_with(options).await?;
        info!(path = %config.path.display(), "connected to warehouse");

        Ok(warehouse)
    }

    /// Opens the store with explicit connect options.
    ///
    /// The only connection is never recycled, which keeps in-memory databases alive for the
    /// lifetime of the handle.
    pub async fn connect_with(options: SqliteConnectOptions) -> EtlResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Applies the embedded migrations creating the star schema. Idempotent.
    pub async fn migrate(&self) -> EtlResult<()> {
        info!("applying warehouse migrations");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        info!("warehouse migrations successfully applied");

        Ok(())
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) async fn begin(&self) -> EtlResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Returns the watermark of `table`, if the table was ever synchronized.
    pub async fn watermark(&self, table: &str) -> EtlResult<Option<NaiveDateTime>> {
        let mut conn = self.pool.acquire().await?;

        load_watermark(&mut conn, table).await
    }

    /// Returns every stored watermark, keyed by table name.
    pub async fn watermarks(&self) -> EtlResult<BTreeMap<String, NaiveDateTime>> {
        let rows: Vec<(String, NaiveDateTime)> = sqlx::query_as(
            "select table_name, last_sync_timestamp from sync_state order by table_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Deletes every bridge, fact and dimension row and every watermark in one unit of work.
    ///
    /// The date dimension is kept.
    pub async fn clear(&self) -> EtlResult<()> {
        let mut tx = self.begin().await?;

        for table in RELOAD_DELETION_ORDER {
            let result = sqlx::query(&format!("delete from {table}"))
                .execute(&mut *tx)
                .await?;

            info!(table, deleted = result.rows_affected(), "cleared table");
        }

        clear_watermarks(&mut tx).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Counts every row of `table`.
    pub async fn count_rows(&self, table: &'static str) -> EtlResult<i64> {
        let count = sqlx::query_scalar(&format!("select count(*) from {table}"))
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Sums every payment amount, returning zero when there are no payments.
    pub async fn total_revenue(&self) -> EtlResult<f64> {
        let total: Option<f64> = sqlx::query_scalar("select sum(amount) from fact_payment")
            .fetch_one(&self.pool)
            .await?;

        Ok(total.unwrap_or(0.0))
    }
}
