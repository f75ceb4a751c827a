use etl::pipeline::Pipeline;
use etl::source::MemorySource;
use etl::sync::rebuild_bridges;
use etl::test_utils::fixtures::{
    SAKILA_FILM_ACTOR_LINKS, SAKILA_FILM_CATEGORY_LINKS, sakila_source,
};
use etl::test_utils::warehouse::spawn_warehouse;
use etl::types::{FilmActorLink, FilmCategoryLink};
use etl::warehouse::BridgeTable;
use etl_config::shared::SyncConfig;
use etl_telemetry::tracing::init_test_tracing;

async fn loaded_pipeline() -> Pipeline<MemorySource> {
    let pipeline = Pipeline::new(
        sakila_source().await,
        spawn_warehouse().await,
        SyncConfig::default(),
    );
    pipeline.incremental_reload().await.unwrap();

    pipeline
}

async fn bridge_rows(pipeline: &Pipeline<MemorySource>, bridge: BridgeTable) -> i64 {
    pipeline
        .warehouse()
        .count_rows(bridge.name())
        .await
        .unwrap()
}

#[tokio::test]
async fn bridges_hold_every_resolvable_link_test() {
    init_test_tracing();
    let pipeline = loaded_pipeline().await;

    assert_eq!(
        bridge_rows(&pipeline, BridgeTable::FilmActor).await,
        SAKILA_FILM_ACTOR_LINKS as i64
    );
    assert_eq!(
        bridge_rows(&pipeline, BridgeTable::FilmCategory).await,
        SAKILA_FILM_CATEGORY_LINKS as i64
    );

    let dangling: i64 = sqlx::query_scalar(
        r#"
        select count(*)
        from bridge_film_actor b
        left join dim_film f on f.film_key = b.film_key
        left join dim_actor a on a.actor_key = b.actor_key
        where f.film_key is null or a.actor_key is null
        "#,
    )
    .fetch_one(pipeline.warehouse().pool())
    .await
    .unwrap();
    assert_eq!(dangling, 0);
}

#[tokio::test]
async fn links_to_missing_dimension_rows_are_dropped_test() {
    init_test_tracing();
    let pipeline = loaded_pipeline().await;
    pipeline
        .source()
        .add_film_actor(FilmActorLink {
            film_id: 1,
            actor_id: 99,
        })
        .await;
    pipeline
        .source()
        .add_film_category(FilmCategoryLink {
            film_id: 42,
            category_id: 1,
        })
        .await;

    let summary = rebuild_bridges(pipeline.source(), pipeline.warehouse())
        .await
        .unwrap();

    assert_eq!(summary.film_actor.loaded, SAKILA_FILM_ACTOR_LINKS);
    assert_eq!(summary.film_actor.dropped, 1);
    assert_eq!(summary.film_category.loaded, SAKILA_FILM_CATEGORY_LINKS);
    assert_eq!(summary.film_category.dropped, 1);
    assert_eq!(
        bridge_rows(&pipeline, BridgeTable::FilmActor).await,
        SAKILA_FILM_ACTOR_LINKS as i64
    );
}

#[tokio::test]
async fn rebuild_reflects_removed_links_test() {
    init_test_tracing();
    let pipeline = loaded_pipeline().await;
    pipeline
        .source()
        .remove_film_actor(FilmActorLink {
            film_id: 1,
            actor_id: 2,
        })
        .await;

    let summary = pipeline.incremental_reload().await.unwrap();

    assert_eq!(summary.bridges.film_actor.loaded, SAKILA_FILM_ACTOR_LINKS - 1);
    assert_eq!(
        bridge_rows(&pipeline, BridgeTable::FilmActor).await,
        SAKILA_FILM_ACTOR_LINKS as i64 - 1
    );
    assert_eq!(
        bridge_rows(&pipeline, BridgeTable::FilmCategory).await,
        SAKILA_FILM_CATEGORY_LINKS as i64
    );
}
