use std::collections::HashSet;
use std::time::Duration;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDateTime;
use etl_config::shared::{IntoConnectOptions, SourceConnectionConfig};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySqlPool, Row};
use tracing::{debug, info};

use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::etl_error;
use crate::source::{Source, SourceRecord, SourceTable};
use crate::types::{FilmActorLink, FilmCategoryLink};

/// Maximum number of pooled connections to the source. Reads are sequential.
const MAX_CONNECTIONS: u32 = 2;

/// How long to wait for a source connection before giving up.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Columns every extraction query reads, grouped by table.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "film",
        &[
            "film_id",
            "title",
            "rating",
            "length",
            "release_year",
            "language_id",
            "last_update",
        ],
    ),
    ("language", &["language_id", "name"]),
    (
        "customer",
        &[
            "customer_id",
            "first_name",
            "last_name",
            "email",
            "active",
            "address_id",
            "last_update",
        ],
    ),
    ("store", &["store_id", "address_id", "last_update"]),
    ("address", &["address_id", "city_id"]),
    ("city", &["city_id", "city", "country_id"]),
    ("country", &["country_id", "country"]),
    (
        "actor",
        &["actor_id", "first_name", "last_name", "last_update"],
    ),
    ("category", &["category_id", "name", "last_update"]),
    (
        "rental",
        &[
            "rental_id",
            "rental_date",
            "return_date",
            "inventory_id",
            "customer_id",
            "staff_id",
            "last_update",
        ],
    ),
    ("inventory", &["inventory_id", "film_id", "store_id"]),
    (
        "payment",
        &[
            "payment_id",
            "customer_id",
            "staff_id",
            "amount",
            "payment_date",
            "last_update",
        ],
    ),
    ("staff", &["staff_id", "store_id"]),
    ("film_actor", &["film_id", "actor_id"]),
    ("film_category", &["film_id", "category_id"]),
];

/// [`Source`] backed by a MySQL database holding the operational schema.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    pool: MySqlPool,
}

impl MySqlSource {
    /// Connects to the source and verifies that every column the extraction queries read is
    /// present.
    ///
    /// Fails with [`ErrorKind::SourceSchemaError`] listing every missing column.
    pub async fn connect(config: &SourceConnectionConfig) -> EtlResult<Self> {
        let options: MySqlConnectOptions = config.with_db();

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(EtlError::from_source)?;

        let source = Self { pool };
        source.verify_schema(&config.name).await?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            "connected to source database"
        );

        Ok(source)
    }

    /// Checks the source's `information_schema` for the columns the pipeline reads.
    async fn verify_schema(&self, database: &str) -> EtlResult<()> {
        let rows = sqlx::query(
            r#"
            select
                cast(table_name as char) as table_name,
                cast(column_name as char) as column_name
            from information_schema.columns
            where table_schema = ?
            "#,
        )
        .bind(database)
        .fetch_all(&self.pool)
        .await
        .map_err(EtlError::from_source)?;

        let mut present = HashSet::with_capacity(rows.len());
        for row in rows {
            let table_name: String = row.try_get("table_name").map_err(EtlError::from_source)?;
            let column_name: String =
                row.try_get("column_name").map_err(EtlError::from_source)?;

            present.insert((table_name.to_lowercase(), column_name.to_lowercase()));
        }

        let errors = missing_columns(&present);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        debug!(database, "source schema verified");

        Ok(())
    }
}

/// Returns one error per required column absent from `present`.
fn missing_columns(present: &HashSet<(String, String)>) -> Vec<EtlError> {
    let mut errors = Vec::new();

    for (table, columns) in REQUIRED_COLUMNS {
        for column in columns.iter() {
            if !present.contains(&((*table).to_owned(), (*column).to_owned())) {
                errors.push(etl_error!(
                    ErrorKind::SourceSchemaError,
                    "Source column missing",
                    format!("{table}.{column}")
                ));
            }
        }
    }

    errors
}

impl Source for MySqlSource {
    async fn extract_changed<R>(&self, since: NaiveDateTime) -> EtlResult<Vec<R>>
    where
        R: SourceRecord,
    {
        sqlx::query_as::<_, R>(R::CHANGED_SINCE_QUERY)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(EtlError::from_source)
    }

    async fn film_actor_links(&self) -> EtlResult<Vec<FilmActorLink>> {
        sqlx::query_as::<_, FilmActorLink>(
            r#"
            select
                cast(film_id as signed) as film_id,
                cast(actor_id as signed) as actor_id
            from film_actor
            order by film_id, actor_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(EtlError::from_source)
    }

    async fn film_category_links(&self) -> EtlResult<Vec<FilmCategoryLink>> {
        sqlx::query_as::<_, FilmCategoryLink>(
            r#"
            select
                cast(film_id as signed) as film_id,
                cast(category_id as signed) as category_id
            from film_category
            order by film_id, category_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(EtlError::from_source)
    }

    async fn count_rows(&self, table: SourceTable) -> EtlResult<i64> {
        let query = format!("select count(*) from {}", table.name());

        sqlx::query_scalar::<_, i64>(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(EtlError::from_source)
    }

    async fn total_revenue(&self) -> EtlResult<f64> {
        let total: Option<BigDecimal> = sqlx::query_scalar("select sum(amount) from payment")
            .fetch_one(&self.pool)
            .await
            .map_err(EtlError::from_source)?;

        match total {
            Some(total) => total.to_f64().ok_or_else(|| {
                etl_error!(
                    ErrorKind::ConversionError,
                    "Revenue does not fit a float",
                    total
                )
            }),
            None => Ok(0.0),
        }
    }
}
