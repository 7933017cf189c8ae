//! Router assembly and shared handler state.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use petstore_db::SessionProvider;

use crate::domain::service::{CategoryService, OrderService, PetService, TagService, UserService};

use super::handlers::{categories, meta, orders, pets, tags, users};
use super::health::{self, HealthState};
use super::middleware::db_session;

#[derive(Clone)]
pub struct AppState {
    pub pets: PetService,
    pub categories: CategoryService,
    pub tags: TagService,
    pub users: UserService,
    pub orders: OrderService,
    pub health: Arc<HealthState>,
    pub env: String,
}

impl AppState {
    #[must_use]
    pub fn new(env: impl Into<String>) -> Self {
        Self {
            pets: PetService::new(),
            categories: CategoryService::new(),
            tags: TagService::new(),
            users: UserService::new(),
            orders: OrderService::new(),
            health: Arc::new(HealthState::default()),
            env: env.into(),
        }
    }
}

/// Build the full application router.
///
/// The session middleware wraps only the `/v1` API: probes and the root
/// endpoint must answer even when the database is unavailable.
pub fn router(state: AppState, provider: SessionProvider) -> Router {
    let api = Router::new()
        .route("/v1/pets", get(pets::list).post(pets::create))
        .route(
            "/v1/pets/{pet_id}",
            get(pets::get).patch(pets::update).delete(pets::remove),
        )
        .route(
            "/v1/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/v1/categories/{category_id}",
            get(categories::get).delete(categories::remove),
        )
        .route("/v1/tags", get(tags::list).post(tags::create))
        .route("/v1/tags/{tag_id}", get(tags::get).delete(tags::remove))
        .route("/v1/users", get(users::list).post(users::create))
        .route("/v1/users/{user_id}", get(users::get).delete(users::remove))
        .route("/v1/orders", get(orders::list).post(orders::create))
        .route(
            "/v1/orders/{order_id}",
            get(orders::get).delete(orders::remove),
        )
        .layer(from_fn_with_state(provider, db_session));

    Router::new()
        .merge(api)
        .route("/", get(meta::root))
        .route("/.internal/healthz/startup", get(health::startup_probe))
        .route("/.internal/healthz/liveness", get(health::liveness_probe))
        .route("/.internal/healthz/readiness", get(health::readiness_probe))
        .with_state(state)
}
