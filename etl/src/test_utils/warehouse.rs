use std::str::FromStr;

use etl_config::shared::CalendarConfig;
use sqlx::sqlite::SqliteConnectOptions;

use crate::warehouse::{Warehouse, generate_calendar};

/// Creates a private in-memory warehouse with every migration applied.
///
/// The database lives as long as the returned handle.
///
/// # Panics
///
/// Panics if the database cannot be opened or migrated.
pub async fn spawn_warehouse() -> Warehouse {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse in-memory connection string")
        .foreign_keys(true);

    let warehouse = Warehouse::connect_with(options)
        .await
        .expect("Failed to open in-memory warehouse");

    warehouse
        .migrate()
        .await
        .expect("Failed to run warehouse migrations");

    warehouse
}

/// Creates a warehouse like [`spawn_warehouse`] with the date dimension filled for
/// `[start_year, end_year]`.
pub async fn spawn_warehouse_with_calendar(start_year: i32, end_year: i32) -> Warehouse {
    let warehouse = spawn_warehouse().await;

    let config = CalendarConfig {
        start_year,
        end_year,
        ..Default::default()
    };
    generate_calendar(&warehouse, &config)
        .await
        .expect("Failed to generate calendar");

    warehouse
}
