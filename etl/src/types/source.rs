use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;

/// A film joined with the name of its language.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SourceFilm {
    pub film_id: i64,
    pub title: String,
    pub rating: Option<String>,
    pub length: Option<i64>,
    pub release_year: Option<i64>,
    pub language: Option<String>,
    pub last_update: NaiveDateTime,
}

/// A customer denormalized with the city and country of its address.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SourceCustomer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub active: i64,
    pub city: String,
    pub country: String,
    pub last_update: NaiveDateTime,
}

/// A store denormalized with the city and country of its address.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SourceStore {
    pub store_id: i64,
    pub city: String,
    pub country: String,
    pub last_update: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SourceActor {
    pub actor_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub last_update: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SourceCategory {
    pub category_id: i64,
    pub name: String,
    pub last_update: NaiveDateTime,
}

/// A rental with the film and store of the rented inventory item.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SourceRental {
    pub rental_id: i64,
    pub rental_date: NaiveDateTime,
    pub return_date: Option<NaiveDateTime>,
    pub customer_id: i64,
    pub staff_id: i64,
    pub film_id: i64,
    pub store_id: i64,
    pub last_update: NaiveDateTime,
}

/// A payment with the store of the staff member who took it.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SourcePayment {
    pub payment_id: i64,
    pub customer_id: i64,
    pub staff_id: i64,
    pub store_id: i64,
    pub amount: BigDecimal,
    pub payment_date: NaiveDateTime,
    pub last_update: NaiveDateTime,
}

/// Association between a film and one of its actors, by natural keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct FilmActorLink {
    pub film_id: i64,
    pub actor_id: i64,
}

/// Association between a film and one of its categories, by natural keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct FilmCategoryLink {
    pub film_id: i64,
    pub category_id: i64,
}
