use chrono::NaiveDateTime;

use crate::source::{SourceRecord, SourceTable};
use crate::types::{
    SourceActor, SourceCategory, SourceCustomer, SourceFilm, SourcePayment, SourceRental,
    SourceStore,
};

// Identifiers are unsigned in the source schema and are cast so they decode as `i64`.
// Enumerations and fixed-width strings are cast to `CHAR` so they decode as `String`.

impl SourceRecord for SourceFilm {
    const TABLE: SourceTable = SourceTable::Film;

    const CHANGED_SINCE_QUERY: &'static str = r#"
        select
            cast(f.film_id as signed) as film_id,
            f.title as title,
            cast(f.rating as char) as rating,
            cast(f.length as signed) as length,
            cast(f.release_year as signed) as release_year,
            cast(l.name as char) as language,
            f.last_update as last_update
        from film f
        left join language l on l.language_id = f.language_id
        where f.last_update > ?
        order by f.film_id
    "#;

    fn natural_key(&self) -> i64 {
        self.film_id
    }

    fn last_update(&self) -> NaiveDateTime {
        self.last_update
    }
}

impl SourceRecord for SourceCustomer {
    const TABLE: SourceTable = SourceTable::Customer;

    const CHANGED_SINCE_QUERY: &'static str = r#"
        select
            cast(c.customer_id as signed) as customer_id,
            c.first_name as first_name,
            c.last_name as last_name,
            c.email as email,
            cast(c.active as signed) as active,
            ci.city as city,
            co.country as country,
            c.last_update as last_update
        from customer c
        join address a on a.address_id = c.address_id
        join city ci on ci.city_id = a.city_id
        join country co on co.country_id = ci.country_id
        where c.last_update > ?
        order by c.customer_id
    "#;

    fn natural_key(&self) -> i64 {
        self.customer_id
    }

    fn last_update(&self) -> NaiveDateTime {
        self.last_update
    }
}

impl SourceRecord for SourceStore {
    const TABLE: SourceTable = SourceTable::Store;

    const CHANGED_SINCE_QUERY: &'static str = r#"
        select
            cast(s.store_id as signed) as store_id,
            ci.city as city,
            co.country as country,
            s.last_update as last_update
        from store s
        join address a on a.address_id = s.address_id
        join city ci on ci.city_id = a.city_id
        join country co on co.country_id = ci.country_id
        where s.last_update > ?
        order by s.store_id
    "#;

    fn natural_key(&self) -> i64 {
        self.store_id
    }

    fn last_update(&self) -> NaiveDateTime {
        self.last_update
    }
}

impl SourceRecord for SourceActor {
    const TABLE: SourceTable = SourceTable::Actor;

    const CHANGED_SINCE_QUERY: &'static str = r#"
        select
            cast(actor_id as signed) as actor_id,
            first_name,
            last_name,
            last_update
        from actor
        where last_update > ?
        order by actor_id
    "#;

    fn natural_key(&self) -> i64 {
        self.actor_id
    }

    fn last_update(&self) -> NaiveDateTime {
        self.last_update
    }
}

impl SourceRecord for SourceCategory {
    const TABLE: SourceTable = SourceTable::Category;

    const CHANGED_SINCE_QUERY: &'static str = r#"
        select
            cast(category_id as signed) as category_id,
            cast(name as char) as name,
            last_update
        from category
        where last_update > ?
        order by category_id
    "#;

    fn natural_key(&self) -> i64 {
        self.category_id
    }

    fn last_update(&self) -> NaiveDateTime {
        self.last_update
    }
}

impl SourceRecord for SourceRental {
    const TABLE: SourceTable = SourceTable::Rental;

    const CHANGED_SINCE_QUERY: &'static str = r#"
        select
            cast(r.rental_id as signed) as rental_id,
            r.rental_date as rental_date,
            r.return_date as return_date,
            cast(r.customer_id as signed) as customer_id,
            cast(r.staff_id as signed) as staff_id,
            cast(i.film_id as signed) as film_id,
            cast(i.store_id as signed) as store_id,
            r.last_update as last_update
        from rental r
        join inventory i on i.inventory_id = r.inventory_id
        where r.last_update > ?
        order by r.rental_id
    "#;

    fn natural_key(&self) -> i64 {
        self.rental_id
    }

    fn last_update(&self) -> NaiveDateTime {
        self.last_update
    }
}

impl SourceRecord for SourcePayment {
    const TABLE: SourceTable = SourceTable::Payment;

    const CHANGED_SINCE_QUERY: &'static str = r#"
        select
            cast(p.payment_id as signed) as payment_id,
            cast(p.customer_id as signed) as customer_id,
            cast(p.staff_id as signed) as staff_id,
            cast(s.store_id as signed) as store_id,
            p.amount as amount,
            p.payment_date as payment_date,
            p.last_update as last_update
        from payment p
        join staff s on s.staff_id = p.staff_id
        where p.last_update > ?
        order by p.payment_id
    "#;

    fn natural_key(&self) -> i64 {
        self.payment_id
    }

    fn last_update(&self) -> NaiveDateTime {
        self.last_update
    }
}
