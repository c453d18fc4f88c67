// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use tower_http::trace::TraceLayer;

use crate::auth::{authenticate, Auth, Claims, OptionalAuth};
use crate::state::AppState;

pub mod health;

pub fn router(state: AppState) -> Router {
    // Routes behind the middleware are authenticated before the handler runs.
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(from_fn_with_state(state.authenticator.clone(), authenticate));

    Router::new()
        .route("/", get(whoami))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Echo the caller's claims, or `null` for anonymous requests.
pub async fn whoami(OptionalAuth(claims): OptionalAuth) -> Json<Option<Claims>> {
    Json(claims)
}

/// Echo the caller's claims. Requires a token.
pub async fn me(Auth(claims): Auth) -> Json<Claims> {
    Json(claims)
}
