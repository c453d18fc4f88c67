// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    /// Public key status ("ok" or "unavailable").
    pub public_key: String,
}

/// Liveness probe. Always 200.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe.
///
/// Returns 200 if the public key is cached or can be fetched now, 503
/// otherwise. Shares the single in-flight fetch with request traffic.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let keys = state.authenticator.key_cache();
    let available = keys.is_ready() || keys.get_key().await.is_ok();

    let (status, public_key) = if available {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(ReadyResponse {
            status: if available { "ok" } else { "degraded" }.to_string(),
            public_key: public_key.to_string(),
        }),
    )
}
