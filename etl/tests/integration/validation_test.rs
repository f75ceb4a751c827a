use etl::pipeline::Pipeline;
use etl::test_utils::fixtures::{payment, sakila_source, timestamp};
use etl::test_utils::warehouse::spawn_warehouse;
use etl::validation::{CheckStatus, ValidatedEntity};
use etl_config::shared::SyncConfig;
use etl_telemetry::tracing::init_test_tracing;

#[tokio::test]
async fn validation_reports_every_mismatch_test() {
    init_test_tracing();
    let pipeline = Pipeline::new(
        sakila_source().await,
        spawn_warehouse().await,
        SyncConfig::default(),
    );
    pipeline.incremental_reload().await.unwrap();
    sqlx::query("delete from fact_payment where payment_id = 3")
        .execute(pipeline.warehouse().pool())
        .await
        .unwrap();

    let report = pipeline.validate().await.unwrap();

    assert_eq!(report.failures(), 2);
    for check in &report.counts {
        let expected = if check.entity == ValidatedEntity::Payments {
            CheckStatus::Fail
        } else {
            CheckStatus::Ok
        };
        assert_eq!(check.status(), expected, "{:?}", check.entity);
    }
    assert_eq!(report.revenue.status(), CheckStatus::Fail);
    assert!(report.to_string().contains("Payments"));
}

#[tokio::test]
async fn revenue_mismatch_alone_is_detected_test() {
    init_test_tracing();
    let pipeline = Pipeline::new(
        sakila_source().await,
        spawn_warehouse().await,
        SyncConfig::default(),
    );
    pipeline.incremental_reload().await.unwrap();
    pipeline
        .source()
        .upsert(payment(
            1,
            1,
            1,
            "3.99",
            "2005-05-25 11:30:37",
            timestamp(15, 11),
        ))
        .await;

    let report = pipeline.validate().await.unwrap();

    assert_eq!(report.failures(), 1);
    assert_eq!(report.revenue.status(), CheckStatus::Fail);
    assert!(
        report
            .counts
            .iter()
            .all(|check| check.status() == CheckStatus::Ok)
    );

    // The changed amount is not newer than the watermark, so it is never picked up.
    pipeline.incremental_reload().await.unwrap();
    assert!(!pipeline.validate().await.unwrap().is_ok());
}
