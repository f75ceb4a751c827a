//! Helpers shared by unit and integration tests.
//!
//! [`warehouse`] spawns isolated in-memory warehouses with the star schema applied and
//! [`fixtures`] builds a small sakila dataset inside a [`MemorySource`](crate::source::MemorySource).

pub mod fixtures;
pub mod warehouse;
