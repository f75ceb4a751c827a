use chrono::NaiveDateTime;
use etl::error::ErrorKind;
use etl::pipeline::Pipeline;
use etl::source::{MemorySource, Source, SourceTable};
use etl::sync::{sync_dimensions, sync_facts};
use etl::test_utils::fixtures::{customer, rental, sakila_source, timestamp};
use etl::test_utils::warehouse::spawn_warehouse;
use etl::types::SourceCustomer;
use etl::warehouse::{DimCustomer, DimCustomerRow, FactRental, TargetTable};
use etl_config::shared::SyncConfig;
use etl_telemetry::tracing::init_test_tracing;

async fn customer_key(pipeline: &Pipeline<MemorySource>, customer_id: i64) -> Option<i64> {
    sqlx::query_scalar("select customer_key from dim_customer where customer_id = ?")
        .bind(customer_id)
        .fetch_optional(pipeline.warehouse().pool())
        .await
        .unwrap()
}

async fn customer_stamp(pipeline: &Pipeline<MemorySource>, customer_id: i64) -> NaiveDateTime {
    sqlx::query_scalar("select last_update from dim_customer where customer_id = ?")
        .bind(customer_id)
        .fetch_one(pipeline.warehouse().pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn second_incremental_reload_processes_nothing_test() {
    init_test_tracing();
    let pipeline = Pipeline::new(
        sakila_source().await,
        spawn_warehouse().await,
        SyncConfig::default(),
    );

    pipeline.incremental_reload().await.unwrap();
    let watermarks = pipeline.warehouse().watermarks().await.unwrap();
    let customers: Vec<DimCustomerRow> = sqlx::query_as("select * from dim_customer")
        .fetch_all(pipeline.warehouse().pool())
        .await
        .unwrap();

    let summary = pipeline.incremental_reload().await.unwrap();

    assert!(summary.tables().all(|outcome| outcome.is_skipped()));
    assert_eq!(pipeline.warehouse().watermarks().await.unwrap(), watermarks);
    let customers_after: Vec<DimCustomerRow> = sqlx::query_as("select * from dim_customer")
        .fetch_all(pipeline.warehouse().pool())
        .await
        .unwrap();
    assert_eq!(customers_after, customers);
    assert_eq!(
        pipeline.warehouse().count_rows(FactRental::NAME).await.unwrap(),
        3
    );
}

#[tokio::test]
async fn new_customer_is_loaded_with_its_location_test() {
    init_test_tracing();
    let source = MemorySource::new();
    let changed_at = timestamp(15, 4);
    source
        .upsert(customer(1, "MARY", "SMITH", "Sasebo", "Japan", changed_at))
        .await;
    let warehouse = spawn_warehouse().await;
    assert_eq!(warehouse.watermark(DimCustomer::NAME).await.unwrap(), None);

    let outcomes = sync_dimensions(&source, &warehouse, &SyncConfig::default())
        .await
        .unwrap();

    let customer_outcome = outcomes
        .iter()
        .find(|outcome| outcome.table == DimCustomer::NAME)
        .unwrap();
    assert_eq!(customer_outcome.inserted, 1);

    let rows: Vec<DimCustomerRow> = sqlx::query_as("select * from dim_customer")
        .fetch_all(warehouse.pool())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].city, "Sasebo");
    assert_eq!(rows[0].country, "Japan");

    let watermark = warehouse.watermark(DimCustomer::NAME).await.unwrap().unwrap();
    assert!(watermark >= changed_at);

    // Tables without source rows get no watermark.
    assert_eq!(warehouse.watermarks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn updated_rows_keep_their_surrogate_keys_test() {
    init_test_tracing();
    let pipeline = Pipeline::new(
        sakila_source().await,
        spawn_warehouse().await,
        SyncConfig::default(),
    );
    pipeline.incremental_reload().await.unwrap();
    let original_key = customer_key(&pipeline, 1).await.unwrap();

    let mut moved: SourceCustomer = pipeline.source().get(1).await.unwrap();
    moved.city = "Osaka".to_owned();
    moved.last_update = timestamp(16, 9);
    pipeline.source().upsert(moved).await;

    let summary = pipeline.incremental_reload().await.unwrap();

    let outcome = summary
        .tables()
        .find(|outcome| outcome.table == DimCustomer::NAME)
        .unwrap();
    assert_eq!(outcome.extracted, 1);
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.watermark, Some(timestamp(16, 9)));
    assert_eq!(customer_key(&pipeline, 1).await, Some(original_key));

    let city: String = sqlx::query_scalar("select city from dim_customer where customer_id = 1")
        .fetch_one(pipeline.warehouse().pool())
        .await
        .unwrap();
    assert_eq!(city, "Osaka");
    assert_eq!(
        pipeline.warehouse().count_rows(DimCustomer::NAME).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn touched_source_row_is_restamped_test() {
    init_test_tracing();
    let pipeline = Pipeline::new(
        sakila_source().await,
        spawn_warehouse().await,
        SyncConfig::default(),
    );
    pipeline.incremental_reload().await.unwrap();
    let stamped_before = customer_stamp(&pipeline, 1).await;
    let untouched_before = customer_stamp(&pipeline, 2).await;

    let mut touched: SourceCustomer = pipeline.source().get(1).await.unwrap();
    touched.last_update = timestamp(20, 9);
    pipeline.source().upsert(touched).await;

    let summary = pipeline.incremental_reload().await.unwrap();

    let outcome = summary
        .tables()
        .find(|outcome| outcome.table == DimCustomer::NAME)
        .unwrap();
    assert_eq!(outcome.extracted, 1);
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.unchanged, 0);
    assert!(customer_stamp(&pipeline, 1).await > stamped_before);
    assert_eq!(customer_stamp(&pipeline, 2).await, untouched_before);
}

#[tokio::test]
async fn overlap_window_reapplies_rows_without_rewriting_them_test() {
    init_test_tracing();
    let config = SyncConfig {
        watermark_overlap_secs: 3600,
        ..SyncConfig::default()
    };
    let pipeline = Pipeline::new(sakila_source().await, spawn_warehouse().await, config);
    pipeline.incremental_reload().await.unwrap();
    let watermarks = pipeline.warehouse().watermarks().await.unwrap();

    let summary = pipeline.incremental_reload().await.unwrap();

    for outcome in summary.tables() {
        assert!(outcome.extracted > 0, "{} was not re-read", outcome.table);
        assert_eq!(outcome.unchanged, outcome.extracted);
        assert_eq!(outcome.inserted + outcome.updated, 0);
    }
    assert_eq!(pipeline.warehouse().watermarks().await.unwrap(), watermarks);
}

#[tokio::test]
async fn unresolved_fact_reference_is_filled_in_later_test() {
    init_test_tracing();
    let source = sakila_source().await;
    source
        .upsert(rental(
            4,
            99,
            1,
            1,
            "2005-05-25 00:00:00",
            None,
            timestamp(15, 10),
        ))
        .await;
    let warehouse = spawn_warehouse().await;
    let config = SyncConfig::default();

    sync_dimensions(&source, &warehouse, &config).await.unwrap();
    sync_facts(&source, &warehouse, &config).await.unwrap();

    let missing: Option<i64> =
        sqlx::query_scalar("select customer_key from fact_rental where rental_id = 4")
            .fetch_one(warehouse.pool())
            .await
            .unwrap();
    assert_eq!(missing, None);

    source
        .upsert(customer(99, "LINDA", "WILLIAMS", "Athenai", "Greece", timestamp(16, 1)))
        .await;
    source
        .upsert(rental(
            4,
            99,
            1,
            1,
            "2005-05-25 00:00:00",
            Some("2005-05-27 00:00:00"),
            timestamp(16, 2),
        ))
        .await;

    sync_dimensions(&source, &warehouse, &config).await.unwrap();
    sync_facts(&source, &warehouse, &config).await.unwrap();

    let (customer_key, duration): (Option<i64>, i64) = sqlx::query_as(
        "select customer_key, rental_duration_days from fact_rental where rental_id = 4",
    )
    .fetch_one(warehouse.pool())
    .await
    .unwrap();
    assert!(customer_key.is_some());
    assert_eq!(duration, 2);
}

#[tokio::test]
async fn source_failure_keeps_the_tables_committed_before_it_test() {
    init_test_tracing();
    let pipeline = Pipeline::new(
        sakila_source().await,
        spawn_warehouse().await,
        SyncConfig::default(),
    );
    pipeline.source().fail_reads(SourceTable::Payment).await;

    let err = pipeline.incremental_reload().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
    let watermarks = pipeline.warehouse().watermarks().await.unwrap();
    assert_eq!(watermarks.len(), 6);
    assert!(watermarks.contains_key(FactRental::NAME));
    assert!(!watermarks.contains_key("fact_payment"));
    assert_eq!(
        pipeline.warehouse().count_rows("fact_payment").await.unwrap(),
        0
    );

    pipeline.source().restore_reads().await;
    let summary = pipeline.incremental_reload().await.unwrap();

    let payments = summary.facts.last().unwrap();
    assert_eq!(payments.inserted, 3);
    assert!(summary.dimensions.iter().all(|outcome| outcome.is_skipped()));
    assert_eq!(
        pipeline.source().count_rows(SourceTable::Payment).await.unwrap(),
        pipeline.warehouse().count_rows("fact_payment").await.unwrap()
    );
}
