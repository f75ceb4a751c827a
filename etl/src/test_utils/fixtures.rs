//! A trimmed-down sakila dataset.
//!
//! Three films, two customers, two stores, three actors, two categories, three rentals and
//! three payments, with every reference resolvable.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};

use crate::source::MemorySource;
use crate::types::{
    FilmActorLink, FilmCategoryLink, SourceActor, SourceCategory, SourceCustomer, SourceFilm,
    SourcePayment, SourceRental, SourceStore,
};

/// Sum of the fixture payment amounts.
pub const SAKILA_TOTAL_REVENUE: f64 = 9.97;

/// Number of film to actor associations in the fixture.
pub const SAKILA_FILM_ACTOR_LINKS: usize = 4;

/// Number of film to category associations in the fixture.
pub const SAKILA_FILM_CATEGORY_LINKS: usize = 3;

/// Returns `2006-02-{day} {hour}:00:00`, the range sakila stamps its rows with.
pub fn timestamp(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2006, 2, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("Invalid fixture timestamp")
}

/// Parses a `YYYY-MM-DD HH:MM:SS` literal.
pub fn datetime(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").expect("Invalid fixture datetime")
}

pub fn film(film_id: i64, title: &str, last_update: NaiveDateTime) -> SourceFilm {
    SourceFilm {
        film_id,
        title: title.to_owned(),
        rating: Some("PG".to_owned()),
        length: Some(86),
        release_year: Some(2006),
        language: Some("English".to_owned()),
        last_update,
    }
}

pub fn customer(
    customer_id: i64,
    first_name: &str,
    last_name: &str,
    city: &str,
    country: &str,
    last_update: NaiveDateTime,
) -> SourceCustomer {
    SourceCustomer {
        customer_id,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        email: Some(format!("{first_name}.{last_name}@sakilacustomer.org")),
        active: 1,
        city: city.to_owned(),
        country: country.to_owned(),
        last_update,
    }
}

pub fn store(store_id: i64, city: &str, country: &str, last_update: NaiveDateTime) -> SourceStore {
    SourceStore {
        store_id,
        city: city.to_owned(),
        country: country.to_owned(),
        last_update,
    }
}

pub fn actor(
    actor_id: i64,
    first_name: &str,
    last_name: &str,
    last_update: NaiveDateTime,
) -> SourceActor {
    SourceActor {
        actor_id,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        last_update,
    }
}

pub fn category(category_id: i64, name: &str, last_update: NaiveDateTime) -> SourceCategory {
    SourceCategory {
        category_id,
        name: name.to_owned(),
        last_update,
    }
}

/// Builds a rental of `film_id` from store `store_id`, served by the store's staff member.
pub fn rental(
    rental_id: i64,
    customer_id: i64,
    film_id: i64,
    store_id: i64,
    rental_date: &str,
    return_date: Option<&str>,
    last_update: NaiveDateTime,
) -> SourceRental {
    SourceRental {
        rental_id,
        rental_date: datetime(rental_date),
        return_date: return_date.map(datetime),
        customer_id,
        staff_id: store_id,
        film_id,
        store_id,
        last_update,
    }
}

/// Builds a payment taken by the staff member of store `store_id`.
pub fn payment(
    payment_id: i64,
    customer_id: i64,
    store_id: i64,
    amount: &str,
    payment_date: &str,
    last_update: NaiveDateTime,
) -> SourcePayment {
    SourcePayment {
        payment_id,
        customer_id,
        staff_id: store_id,
        store_id,
        amount: BigDecimal::from_str(amount).expect("Invalid fixture amount"),
        payment_date: datetime(payment_date),
        last_update,
    }
}

/// Fills `source` with the fixture dataset.
pub async fn load_sakila(source: &MemorySource) {
    source
        .upsert_all([
            film(1, "ACADEMY DINOSAUR", timestamp(15, 5)),
            film(2, "ACE GOLDFINGER", timestamp(15, 5)),
            film(3, "ADAPTATION HOLES", timestamp(15, 5)),
        ])
        .await;
    source
        .upsert_all([
            customer(1, "MARY", "SMITH", "Sasebo", "Japan", timestamp(15, 4)),
            customer(
                2,
                "PATRICIA",
                "JOHNSON",
                "San Bernardino",
                "United States",
                timestamp(15, 4),
            ),
        ])
        .await;
    source
        .upsert_all([
            store(1, "Lethbridge", "Canada", timestamp(15, 4)),
            store(2, "Woodridge", "Australia", timestamp(15, 4)),
        ])
        .await;
    source
        .upsert_all([
            actor(1, "PENELOPE", "GUINESS", timestamp(15, 4)),
            actor(2, "NICK", "WAHLBERG", timestamp(15, 4)),
            actor(3, "ED", "CHASE", timestamp(15, 4)),
        ])
        .await;
    source
        .upsert_all([
            category(1, "Action", timestamp(15, 4)),
            category(2, "Animation", timestamp(15, 4)),
        ])
        .await;
    source
        .upsert_all([
            rental(
                1,
                1,
                1,
                1,
                "2005-05-24 22:53:30",
                Some("2005-05-26 22:04:30"),
                timestamp(15, 10),
            ),
            rental(
                2,
                2,
                2,
                1,
                "2005-05-24 22:54:33",
                Some("2005-05-28 19:40:33"),
                timestamp(15, 10),
            ),
            rental(3, 1, 3, 2, "2005-05-24 23:03:39", None, timestamp(15, 10)),
        ])
        .await;
    source
        .upsert_all([
            payment(1, 1, 1, "2.99", "2005-05-25 11:30:37", timestamp(15, 11)),
            payment(2, 1, 2, "0.99", "2005-05-28 10:35:23", timestamp(15, 11)),
            payment(3, 2, 1, "5.99", "2005-06-15 00:54:12", timestamp(15, 11)),
        ])
        .await;

    for (film_id, actor_id) in [(1, 1), (1, 2), (2, 3), (3, 1)] {
        source
            .add_film_actor(FilmActorLink { film_id, actor_id })
            .await;
    }
    for (film_id, category_id) in [(1, 2), (2, 1), (3, 2)] {
        source
            .add_film_category(FilmCategoryLink {
                film_id,
                category_id,
            })
            .await;
    }
}

/// Returns a new source holding the fixture dataset.
pub async fn sakila_source() -> MemorySource {
    let source = MemorySource::new();
    load_sakila(&source).await;

    source
}
