use etl::error::ErrorKind;
use etl::failpoints::SYNC_TABLE_BEFORE_COMMIT;
use etl::pipeline::Pipeline;
use etl::test_utils::fixtures::sakila_source;
use etl::test_utils::warehouse::spawn_warehouse;
use etl::warehouse::{FactPayment, FactRental, TargetTable};
use etl_config::shared::SyncConfig;
use etl_telemetry::tracing::init_test_tracing;
use fail::FailScenario;

#[tokio::test]
async fn failed_commit_rolls_back_only_the_failing_table_test() {
    init_test_tracing();
    let scenario = FailScenario::setup();
    fail::cfg(SYNC_TABLE_BEFORE_COMMIT, "return(fact_payment)").unwrap();

    let pipeline = Pipeline::new(
        sakila_source().await,
        spawn_warehouse().await,
        SyncConfig::default(),
    );

    let err = pipeline.incremental_reload().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FailpointTriggered);
    let watermarks = pipeline.warehouse().watermarks().await.unwrap();
    assert_eq!(watermarks.len(), 6);
    assert!(!watermarks.contains_key(FactPayment::NAME));
    assert_eq!(
        pipeline.warehouse().count_rows(FactRental::NAME).await.unwrap(),
        3
    );
    assert_eq!(
        pipeline.warehouse().count_rows(FactPayment::NAME).await.unwrap(),
        0
    );

    fail::remove(SYNC_TABLE_BEFORE_COMMIT);
    let summary = pipeline.incremental_reload().await.unwrap();

    let payments = summary
        .tables()
        .find(|outcome| outcome.table == FactPayment::NAME)
        .unwrap();
    assert_eq!(payments.inserted, 3);
    assert!(
        summary
            .tables()
            .filter(|outcome| outcome.table != FactPayment::NAME)
            .all(|outcome| outcome.is_skipped())
    );
    assert!(pipeline.validate().await.unwrap().is_ok());

    scenario.teardown();
}
