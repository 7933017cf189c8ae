//! Request-scoped database session middleware.
//!
//! One session per request: opened before the handler runs, installed in
//! task-local context for the duration of the call, and disposed of on the
//! way out. Service operations commit their own transactional scopes; this
//! layer finalizes whatever is still open (streaming handlers, panics caught
//! upstream) and guarantees the session never outlives its request.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use petstore_db::{SessionProvider, with_session};
use petstore_problem::Problem;

/// Success responses commit any leftover transaction; everything else rolls
/// it back. A failed commit turns the response into a 500 problem because
/// the handler's writes were not durable. A failed rollback on the error
/// path loses nothing the client was promised, so the handler's problem
/// body goes out unchanged and the failure is only logged.
pub async fn db_session(
    State(provider): State<SessionProvider>,
    request: Request,
    next: Next,
) -> Response {
    let session = Arc::new(provider.open_session());

    let response = with_session(Arc::clone(&session), next.run(request)).await;

    if response.status().is_success() {
        let committed = session.commit().await;
        session.close().await;
        if let Err(err) = committed {
            tracing::error!(error = %err, "failed to commit request session");
            return Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred",
            )
            .into_response();
        }
    } else {
        if let Err(err) = session.rollback().await {
            tracing::error!(error = %err, "failed to roll back request session");
        }
        session.close().await;
    }

    response
}
