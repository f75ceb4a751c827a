use chrono::NaiveDate;
use etl::test_utils::warehouse::spawn_warehouse;
use etl::warehouse::{CalendarDay, generate_calendar};
use etl_config::shared::CalendarConfig;
use etl_telemetry::tracing::init_test_tracing;

fn days_between(start_year: i32, end_year: i32) -> usize {
    let first = NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap();
    let after_last = NaiveDate::from_ymd_opt(end_year + 1, 1, 1).unwrap();

    (after_last - first).num_days() as usize
}

#[tokio::test]
async fn calendar_has_one_row_per_day_test() {
    init_test_tracing();
    let warehouse = spawn_warehouse().await;
    let config = CalendarConfig::default();

    let summary = generate_calendar(&warehouse, &config).await.unwrap();

    let expected_days = days_between(2000, 2030);
    assert_eq!(summary.generated, expected_days);
    assert_eq!(summary.skipped, 0);

    let (rows, distinct_dates): (i64, i64) =
        sqlx::query_as("select count(*), count(distinct date) from dim_date")
            .fetch_one(warehouse.pool())
            .await
            .unwrap();
    assert_eq!(rows as usize, expected_days);
    assert_eq!(distinct_dates, rows);

    // SQLite numbers weekdays from Sunday = 0.
    let misflagged: i64 = sqlx::query_scalar(
        "select count(*) from dim_date where is_weekend != (strftime('%w', date) in ('0', '6'))",
    )
    .fetch_one(warehouse.pool())
    .await
    .unwrap();
    assert_eq!(misflagged, 0);

    let leap_day: CalendarDay = sqlx::query_as("select * from dim_date where date_key = 20240229")
        .fetch_one(warehouse.pool())
        .await
        .unwrap();
    assert_eq!(
        leap_day,
        CalendarDay::from_date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
    );
}

#[tokio::test]
async fn calendar_generation_only_fills_gaps_test() {
    init_test_tracing();
    let warehouse = spawn_warehouse().await;
    let narrow = CalendarConfig {
        start_year: 2005,
        end_year: 2005,
        batch_size: 100,
    };
    let wide = CalendarConfig {
        start_year: 2005,
        end_year: 2006,
        batch_size: 100,
    };

    generate_calendar(&warehouse, &narrow).await.unwrap();
    let summary = generate_calendar(&warehouse, &wide).await.unwrap();

    assert_eq!(summary.skipped, 365);
    assert_eq!(summary.generated, 365);

    let rerun = generate_calendar(&warehouse, &wide).await.unwrap();
    assert_eq!(rerun.generated, 0);
    assert_eq!(rerun.skipped, 730);
}

#[tokio::test]
async fn inverted_range_is_rejected_test() {
    init_test_tracing();
    let warehouse = spawn_warehouse().await;
    let config = CalendarConfig {
        start_year: 2030,
        end_year: 2000,
        batch_size: 100,
    };

    let err = generate_calendar(&warehouse, &config).await.unwrap_err();

    assert_eq!(err.kind(), etl::error::ErrorKind::ConfigError);
    assert_eq!(warehouse.count_rows("dim_date").await.unwrap(), 0);
}
