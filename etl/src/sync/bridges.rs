use std::fmt;

use metrics::counter;
use tracing::{info, warn};

use crate::error::EtlResult;
use crate::metrics::{
    ETL_BRIDGE_LINKS_DROPPED_TOTAL, ETL_BRIDGE_LINKS_LOADED_TOTAL, TABLE_NAME_LABEL,
};
use crate::source::Source;
use crate::warehouse::{
    BridgeTable, DimActor, DimCategory, DimFilm, KeyMap, Warehouse, clear_bridges,
    insert_bridge_rows,
};

/// Links loaded into and dropped from one bridge table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeOutcome {
    /// Source associations whose endpoints both resolved.
    pub loaded: usize,
    /// Source associations with at least one endpoint missing from the dimensions.
    pub dropped: usize,
}

/// Result of a bridge rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeSummary {
    pub film_actor: BridgeOutcome,
    pub film_category: BridgeOutcome,
}

impl fmt::Display for BridgeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} loaded, {} dropped; {}: {} loaded, {} dropped",
            BridgeTable::FilmActor.name(),
            self.film_actor.loaded,
            self.film_actor.dropped,
            BridgeTable::FilmCategory.name(),
            self.film_category.loaded,
            self.film_category.dropped,
        )
    }
}

/// Translates natural-key pairs through two key maps, dropping pairs with a missing endpoint.
fn resolve_links(
    links: impl IntoIterator<Item = (i64, i64)>,
    films: &KeyMap,
    others: &KeyMap,
) -> (Vec<(i64, i64)>, usize) {
    let mut resolved = Vec::new();
    let mut dropped = 0;

    for (film_id, other_id) in links {
        match (films.resolve(film_id), others.resolve(other_id)) {
            (Some(film_key), Some(other_key)) => resolved.push((film_key, other_key)),
            _ => dropped += 1,
        }
    }

    (resolved, dropped)
}

/// Replaces both bridge tables with the full current source association set.
///
/// Links are read from the source first. Then, in one unit of work, every bridge row is
/// deleted, the film, actor and category key maps are loaded and each association whose
/// endpoints both exist in the dimensions is inserted. The others are dropped.
pub async fn rebuild_bridges<S>(source: &S, warehouse: &Warehouse) -> EtlResult<BridgeSummary>
where
    S: Source,
{
    info!("rebuilding bridge tables");

    let film_actor_links = source.film_actor_links().await?;
    let film_category_links = source.film_category_links().await?;

    let mut tx = warehouse.begin().await?;
    clear_bridges(&mut tx).await?;

    let films = KeyMap::load::<DimFilm>(&mut tx).await?;
    let actors = KeyMap::load::<DimActor>(&mut tx).await?;
    let categories = KeyMap::load::<DimCategory>(&mut tx).await?;

    let (film_actor_rows, film_actor_dropped) = resolve_links(
        film_actor_links
            .iter()
            .map(|link| (link.film_id, link.actor_id)),
        &films,
        &actors,
    );
    insert_bridge_rows(&mut tx, BridgeTable::FilmActor, &film_actor_rows).await?;

    let (film_category_rows, film_category_dropped) = resolve_links(
        film_category_links
            .iter()
            .map(|link| (link.film_id, link.category_id)),
        &films,
        &categories,
    );
    insert_bridge_rows(&mut tx, BridgeTable::FilmCategory, &film_category_rows).await?;

    tx.commit().await?;

    let summary = BridgeSummary {
        film_actor: BridgeOutcome {
            loaded: film_actor_rows.len(),
            dropped: film_actor_dropped,
        },
        film_category: BridgeOutcome {
            loaded: film_category_rows.len(),
            dropped: film_category_dropped,
        },
    };

    for (bridge, outcome) in [
        (BridgeTable::FilmActor, summary.film_actor),
        (BridgeTable::FilmCategory, summary.film_category),
    ] {
        counter!(ETL_BRIDGE_LINKS_LOADED_TOTAL, TABLE_NAME_LABEL => bridge.name())
            .increment(outcome.loaded as u64);
        counter!(ETL_BRIDGE_LINKS_DROPPED_TOTAL, TABLE_NAME_LABEL => bridge.name())
            .increment(outcome.dropped as u64);

        if outcome.dropped > 0 {
            warn!(
                table = bridge.name(),
                dropped = outcome.dropped,
                "dropped links referencing rows missing from the dimensions"
            );
        }

        info!(
            table = bridge.name(),
            loaded = outcome.loaded,
            "loaded bridge links"
        );
    }

    Ok(summary)
}
