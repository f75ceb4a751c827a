use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{FromRow, Sqlite};

use crate::types::DateKey;
use crate::warehouse::TargetTable;

/// Film dimension.
#[derive(Debug, Clone, Copy)]
pub struct DimFilm;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DimFilmRow {
    pub film_id: i64,
    pub title: String,
    pub rating: Option<String>,
    pub length: Option<i64>,
    pub language: Option<String>,
    pub release_year: Option<i64>,
}

impl TargetTable for DimFilm {
    const NAME: &'static str = "dim_film";
    const SURROGATE_KEY: &'static str = "film_key";
    const NATURAL_KEY: &'static str = "film_id";
    const COLUMNS: &'static [&'static str] =
        &["title", "rating", "length", "language", "release_year"];

    type Row = DimFilmRow;

    fn natural_key(row: &Self::Row) -> i64 {
        row.film_id
    }

    fn bind_columns<'q>(
        row: &Self::Row,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(row.title.clone())
            .bind(row.rating.clone())
            .bind(row.length)
            .bind(row.language.clone())
            .bind(row.release_year)
    }
}

/// Customer dimension, denormalized with the customer's city and country.
#[derive(Debug, Clone, Copy)]
pub struct DimCustomer;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DimCustomerRow {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub active: i64,
    pub city: String,
    pub country: String,
}

impl TargetTable for DimCustomer {
    const NAME: &'static str = "dim_customer";
    const SURROGATE_KEY: &'static str = "customer_key";
    const NATURAL_KEY: &'static str = "customer_id";
    const COLUMNS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "email",
        "active",
        "city",
        "country",
    ];

    type Row = DimCustomerRow;

    fn natural_key(row: &Self::Row) -> i64 {
        row.customer_id
    }

    fn bind_columns<'q>(
        row: &Self::Row,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(row.first_name.clone())
            .bind(row.last_name.clone())
            .bind(row.email.clone())
            .bind(row.active)
            .bind(row.city.clone())
            .bind(row.country.clone())
    }
}

/// Store dimension, denormalized with the store's city and country.
#[derive(Debug, Clone, Copy)]
pub struct DimStore;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DimStoreRow {
    pub store_id: i64,
    pub city: String,
    pub country: String,
}

impl TargetTable for DimStore {
    const NAME: &'static str = "dim_store";
    const SURROGATE_KEY: &'static str = "store_key";
    const NATURAL_KEY: &'static str = "store_id";
    const COLUMNS: &'static [&'static str] = &["city", "country"];

    type Row = DimStoreRow;

    fn natural_key(row: &Self::Row) -> i64 {
        row.store_id
    }

    fn bind_columns<'q>(
        row: &Self::Row,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query.bind(row.city.clone()).bind(row.country.clone())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DimActor;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DimActorRow {
    pub actor_id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl TargetTable for DimActor {
    const NAME: &'static str = "dim_actor";
    const SURROGATE_KEY: &'static str = "actor_key";
    const NATURAL_KEY: &'static str = "actor_id";
    const COLUMNS: &'static [&'static str] = &["first_name", "last_name"];

    type Row = DimActorRow;

    fn natural_key(row: &Self::Row) -> i64 {
        row.actor_id
    }

    fn bind_columns<'q>(
        row: &Self::Row,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(row.first_name.clone())
            .bind(row.last_name.clone())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DimCategory;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DimCategoryRow {
    pub category_id: i64,
    pub name: String,
}

impl TargetTable for DimCategory {
    const NAME: &'static str = "dim_category";
    const SURROGATE_KEY: &'static str = "category_key";
    const NATURAL_KEY: &'static str = "category_id";
    const COLUMNS: &'static [&'static str] = &["name"];

    type Row = DimCategoryRow;

    fn natural_key(row: &Self::Row) -> i64 {
        row.category_id
    }

    fn bind_columns<'q>(
        row: &Self::Row,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query.bind(row.name.clone())
    }
}

/// Rental facts.
///
/// Dimension references are `None` when the referenced natural key had no dimension row at
/// load time.
#[derive(Debug, Clone, Copy)]
pub struct FactRental;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FactRentalRow {
    pub rental_id: i64,
    pub date_key_rented: DateKey,
    pub date_key_returned: Option<DateKey>,
    pub film_key: Option<i64>,
    pub store_key: Option<i64>,
    pub customer_key: Option<i64>,
    pub staff_id: i64,
    pub rental_duration_days: i64,
}

impl TargetTable for FactRental {
    const NAME: &'static str = "fact_rental";
    const SURROGATE_KEY: &'static str = "fact_rental_key";
    const NATURAL_KEY: &'static str = "rental_id";
    const COLUMNS: &'static [&'static str] = &[
        "date_key_rented",
        "date_key_returned",
        "film_key",
        "store_key",
        "customer_key",
        "staff_id",
        "rental_duration_days",
    ];

    type Row = FactRentalRow;

    fn natural_key(row: &Self::Row) -> i64 {
        row.rental_id
    }

    fn bind_columns<'q>(
        row: &Self::Row,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(row.date_key_rented)
            .bind(row.date_key_returned)
            .bind(row.film_key)
            .bind(row.store_key)
            .bind(row.customer_key)
            .bind(row.staff_id)
            .bind(row.rental_duration_days)
    }
}

/// Payment facts.
#[derive(Debug, Clone, Copy)]
pub struct FactPayment;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FactPaymentRow {
    pub payment_id: i64,
    pub date_key_paid: DateKey,
    pub customer_key: Option<i64>,
    pub store_key: Option<i64>,
    pub staff_id: i64,
    pub amount: f64,
}

impl TargetTable for FactPayment {
    const NAME: &'static str = "fact_payment";
    const SURROGATE_KEY: &'static str = "fact_payment_key";
    const NATURAL_KEY: &'static str = "payment_id";
    const COLUMNS: &'static [&'static str] = &[
        "date_key_paid",
        "customer_key",
        "store_key",
        "staff_id",
        "amount",
    ];

    type Row = FactPaymentRow;

    fn natural_key(row: &Self::Row) -> i64 {
        row.payment_id
    }

    fn bind_columns<'q>(
        row: &Self::Row,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(row.date_key_paid)
            .bind(row.customer_key)
            .bind(row.store_key)
            .bind(row.staff_id)
            .bind(row.amount)
    }
}
