use etl::pipeline::{Pipeline, ReloadMode};
use etl::source::MemorySource;
use etl::test_utils::fixtures::{SAKILA_TOTAL_REVENUE, sakila_source};
use etl::test_utils::warehouse::spawn_warehouse;
use etl::warehouse::{DimActor, FactPayment, TargetTable};
use etl_config::shared::{CalendarConfig, SyncConfig};
use etl_telemetry::tracing::init_test_tracing;

fn sync_config() -> SyncConfig {
    SyncConfig {
        calendar: CalendarConfig {
            start_year: 2005,
            end_year: 2006,
            ..CalendarConfig::default()
        },
        ..SyncConfig::default()
    }
}

async fn initialized_pipeline() -> Pipeline<MemorySource> {
    let pipeline = Pipeline::new(sakila_source().await, spawn_warehouse().await, sync_config());
    pipeline.initialize().await.unwrap();

    pipeline
}

#[tokio::test]
async fn initialize_is_repeatable_test() {
    init_test_tracing();
    let pipeline = initialized_pipeline().await;

    let summary = pipeline.initialize().await.unwrap();

    assert_eq!(summary.generated, 0);
    assert_eq!(summary.skipped, 730);
}

#[tokio::test]
async fn full_reload_passes_validation_test() {
    init_test_tracing();
    let pipeline = initialized_pipeline().await;

    let summary = pipeline.full_reload().await.unwrap();
    let report = pipeline.validate().await.unwrap();

    assert_eq!(summary.mode, ReloadMode::Full);
    assert!(report.is_ok(), "{report}");
    assert_eq!(report.counts.len(), 7);
    assert!((report.revenue.target - SAKILA_TOTAL_REVENUE).abs() < 0.001);
}

#[tokio::test]
async fn full_reload_drops_rows_missing_from_the_source_test() {
    init_test_tracing();
    let pipeline = initialized_pipeline().await;
    pipeline.incremental_reload().await.unwrap();
    sqlx::query(
        r#"
        insert into dim_actor (actor_id, first_name, last_name, last_update)
        values (500, 'GHOST', 'ACTOR', '2006-02-15 04:34:33')
        "#,
    )
    .execute(pipeline.warehouse().pool())
    .await
    .unwrap();
    assert!(!pipeline.validate().await.unwrap().is_ok());

    let summary = pipeline.full_reload().await.unwrap();

    assert!(
        summary
            .tables()
            .all(|outcome| outcome.inserted == outcome.extracted)
    );
    assert_eq!(
        pipeline.warehouse().count_rows(DimActor::NAME).await.unwrap(),
        3
    );
    assert!(pipeline.validate().await.unwrap().is_ok());
    assert_eq!(pipeline.warehouse().count_rows("dim_date").await.unwrap(), 730);
}

#[tokio::test]
async fn fact_date_keys_resolve_to_calendar_days_test() {
    init_test_tracing();
    let pipeline = initialized_pipeline().await;
    pipeline.full_reload().await.unwrap();

    let orphaned: i64 = sqlx::query_scalar(
        r#"
        select count(*)
        from fact_rental r
        left join dim_date d on d.date_key = r.date_key_rented
        where d.date_key is null
        "#,
    )
    .fetch_one(pipeline.warehouse().pool())
    .await
    .unwrap();
    assert_eq!(orphaned, 0);

    let paid_on: i64 =
        sqlx::query_scalar("select date_key_paid from fact_payment where payment_id = 3")
            .fetch_one(pipeline.warehouse().pool())
            .await
            .unwrap();
    assert_eq!(paid_on, 20050615);
    assert_eq!(
        pipeline.warehouse().count_rows(FactPayment::NAME).await.unwrap(),
        3
    );
}
