//! Petstore service module: domain model, storage and the REST surface.
//!
//! The server binary wires this together with a
//! [`petstore_db::SessionProvider`]; everything request-scoped flows through
//! the session middleware installed by [`router`].

pub mod api;
pub mod domain;
pub mod infra;

pub use api::rest::health::HealthState;
pub use api::rest::routes::{AppState, router};
pub use infra::storage::migrations::Migrator;
