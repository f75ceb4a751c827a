use etl_config::shared::SyncConfig;
use sqlx::SqliteConnection;

use crate::error::EtlResult;
use crate::source::Source;
use crate::sync::{TableSync, TableSyncOutcome, sync_table};
use crate::types::{SourceActor, SourceCategory, SourceCustomer, SourceFilm, SourceStore};
use crate::warehouse::{
    DimActor, DimActorRow, DimCategory, DimCategoryRow, DimCustomer, DimCustomerRow, DimFilm,
    DimFilmRow, DimStore, DimStoreRow, Warehouse,
};

impl TableSync for DimFilm {
    type Record = SourceFilm;
    type Context = ();

    async fn prepare(_conn: &mut SqliteConnection) -> EtlResult<()> {
        Ok(())
    }

    fn transform(record: &SourceFilm, _context: &()) -> EtlResult<DimFilmRow> {
        Ok(DimFilmRow {
            film_id: record.film_id,
            title: record.title.clone(),
            rating: record.rating.clone(),
            length: record.length,
            language: record.language.clone(),
            release_year: record.release_year,
        })
    }
}

impl TableSync for DimCustomer {
    type Record = SourceCustomer;
    type Context = ();

    async fn prepare(_conn: &mut SqliteConnection) -> EtlResult<()> {
        Ok(())
    }

    fn transform(record: &SourceCustomer, _context: &()) -> EtlResult<DimCustomerRow> {
        Ok(DimCustomerRow {
            customer_id: record.customer_id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            active: record.active,
            city: record.city.clone(),
            country: record.country.clone(),
        })
    }
}

impl TableSync for DimStore {
    type Record = SourceStore;
    type Context = ();

    async fn prepare(_conn: &mut SqliteConnection) -> EtlResult<()> {
        Ok(())
    }

    fn transform(record: &SourceStore, _context: &()) -> EtlResult<DimStoreRow> {
        Ok(DimStoreRow {
            store_id: record.store_id,
            city: record.city.clone(),
            country: record.country.clone(),
        })
    }
}

impl TableSync for DimActor {
    type Record = SourceActor;
    type Context = ();

    async fn prepare(_conn: &mut SqliteConnection) -> EtlResult<()> {
        Ok(())
    }

    fn transform(record: &SourceActor, _context: &()) -> EtlResult<DimActorRow> {
        Ok(DimActorRow {
            actor_id: record.actor_id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
        })
    }
}

impl TableSync for DimCategory {
    type Record = SourceCategory;
    type Context = ();

    async fn prepare(_conn: &mut SqliteConnection) -> EtlResult<()> {
        Ok(())
    }

    fn transform(record: &SourceCategory, _context: &()) -> EtlResult<DimCategoryRow> {
        Ok(DimCategoryRow {
            category_id: record.category_id,
            name: record.name.clone(),
        })
    }
}

/// Synchronizes film, customer, store, actor and category, in that order.
///
/// Each dimension commits on its own. The first failure aborts the remaining dimensions and
/// leaves the ones already committed in place.
pub async fn sync_dimensions<S>(
    source: &S,
    warehouse: &Warehouse,
    config: &SyncConfig,
) -> EtlResult<Vec<TableSyncOutcome>>
where
    S: Source,
{
    Ok(vec![
        sync_table::<DimFilm, _>(source, warehouse, config).await?,
        sync_table::<DimCustomer, _>(source, warehouse, config).await?,
        sync_table::<DimStore, _>(source, warehouse, config).await?,
        sync_table::<DimActor, _>(source, warehouse, config).await?,
        sync_table::<DimCategory, _>(source, warehouse, config).await?,
    ])
}
