use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::api::rest::routes::AppState;

/// Service identity at `/`.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "petstore",
        "version": env!("CARGO_PKG_VERSION"),
        "env": state.env,
    }))
}
