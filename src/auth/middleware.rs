// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Runs the [`Authenticator`] once per request, before the handler:
//!
//! - anonymous requests pass through with `Authenticated(None)`
//! - valid tokens pass through with `Authenticated(Some(claims))`
//! - anything else is answered with the normalized error response
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(
//!         authenticator.clone(),
//!         authenticate,
//!     ));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::claims::Claims;
use super::Authenticator;

/// Authentication outcome stored in request extensions.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Option<Claims>);

/// Authentication middleware function.
#[instrument(skip_all, name = "authentic.middleware")]
pub async fn authenticate(
    State(authenticator): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticator.authenticate(request.headers()).await {
        Ok(claims) => {
            request.extensions_mut().insert(Authenticated(claims));
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(
                target: "authentic.middleware",
                error_name = err.name,
                status = %err.status_code,
                "Request rejected"
            );
            err.into_response()
        }
    }
}
