//! SeaORM entities for the petstore schema.
//!
//! All primary keys are UUIDv4 values stored as strings so the schema
//! stays portable between SQLite and Postgres.

pub mod category;
pub mod order;
pub mod pet;
pub mod pet_tag;
pub mod tag;
pub mod user;
