use bigdecimal::ToPrimitive;
use chrono::NaiveDateTime;
use etl_config::shared::SyncConfig;
use sqlx::SqliteConnection;

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::source::Source;
use crate::sync::{TableSync, TableSyncOutcome, sync_table};
use crate::types::{DateKey, SourcePayment, SourceRental};
use crate::warehouse::{
    DimCustomer, DimFilm, DimStore, FactPayment, FactPaymentRow, FactRental, FactRentalRow,
    KeyMap, Warehouse,
};

/// Key maps a rental is resolved against.
#[derive(Debug)]
pub struct RentalKeys {
    films: KeyMap,
    stores: KeyMap,
    customers: KeyMap,
}

/// Key maps a payment is resolved against.
#[derive(Debug)]
pub struct PaymentKeys {
    customers: KeyMap,
    stores: KeyMap,
}

/// Whole days between renting and returning, or zero while the item is out.
fn rental_duration_days(rental_date: NaiveDateTime, return_date: Option<NaiveDateTime>) -> i64 {
    return_date.map_or(0, |returned| (returned - rental_date).num_days())
}

impl TableSync for FactRental {
    type Record = SourceRental;
    type Context = RentalKeys;

    async fn prepare(conn: &mut SqliteConnection) -> EtlResult<RentalKeys> {
        Ok(RentalKeys {
            films: KeyMap::load::<DimFilm>(conn).await?,
            stores: KeyMap::load::<DimStore>(conn).await?,
            customers: KeyMap::load::<DimCustomer>(conn).await?,
        })
    }

    fn transform(record: &SourceRental, keys: &RentalKeys) -> EtlResult<FactRentalRow> {
        Ok(FactRentalRow {
            rental_id: record.rental_id,
            date_key_rented: DateKey::from_datetime(record.rental_date),
            date_key_returned: record.return_date.map(DateKey::from_datetime),
            film_key: keys.films.resolve(record.film_id),
            store_key: keys.stores.resolve(record.store_id),
            customer_key: keys.customers.resolve(record.customer_id),
            staff_id: record.staff_id,
            rental_duration_days: rental_duration_days(record.rental_date, record.return_date),
        })
    }
}

impl TableSync for FactPayment {
    type Record = SourcePayment;
    type Context = PaymentKeys;

    async fn prepare(conn: &mut SqliteConnection) -> EtlResult<PaymentKeys> {
        Ok(PaymentKeys {
            customers: KeyMap::load::<DimCustomer>(conn).await?,
            stores: KeyMap::load::<DimStore>(conn).await?,
        })
    }

    fn transform(record: &SourcePayment, keys: &PaymentKeys) -> EtlResult<FactPaymentRow> {
        let amount = record.amount.to_f64().ok_or_else(|| {
            etl_error!(
                ErrorKind::ConversionError,
                "Payment amount does not fit a float",
                format!("payment {} has amount {}", record.payment_id, record.amount)
            )
        })?;

        Ok(FactPaymentRow {
            payment_id: record.payment_id,
            date_key_paid: DateKey::from_datetime(record.payment_date),
            customer_key: keys.customers.resolve(record.customer_id),
            store_key: keys.stores.resolve(record.store_id),
            staff_id: record.staff_id,
            amount,
        })
    }
}

/// Synchronizes rentals, then payments.
///
/// Key maps are loaded inside each fact's unit of work so references reflect the dimensions
/// committed earlier in the same run. Unresolvable references are stored as absent.
pub async fn sync_facts<S>(
    source: &S,
    warehouse: &Warehouse,
    config: &SyncConfig,
) -> EtlResult<Vec<TableSyncOutcome>>
where
    S: Source,
{
    Ok(vec![
        sync_table::<FactRental, _>(source, warehouse, config).await?,
        sync_table::<FactPayment, _>(source, warehouse, config).await?,
    ])
}
