//! Kubernetes-style health probes.
//!
//! Liveness is unconditional: a responding process is alive. Startup and
//! readiness flip with the server lifecycle, so a draining process fails its
//! readiness probe while still finishing in-flight requests.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::State;
use axum::http::StatusCode;

use super::routes::AppState;

#[derive(Debug, Default)]
pub struct HealthState {
    started: AtomicBool,
    ready: AtomicBool,
}

impl HealthState {
    /// Mark startup complete; the process also becomes ready.
    pub fn set_started(&self) {
        self.started.store(true, Ordering::Release);
        self.ready.store(true, Ordering::Release);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

pub async fn startup_probe(State(state): State<AppState>) -> (StatusCode, &'static str) {
    probe(state.health.is_started())
}

pub async fn liveness_probe() -> (StatusCode, &'static str) {
    (StatusCode::OK, "UP")
}

pub async fn readiness_probe(State(state): State<AppState>) -> (StatusCode, &'static str) {
    probe(state.health.is_ready())
}

fn probe(up: bool) -> (StatusCode, &'static str) {
    if up {
        (StatusCode::OK, "UP")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "DOWN")
    }
}
