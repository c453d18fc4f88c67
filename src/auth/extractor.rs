// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated claims.
//!
//! ```rust,ignore
//! async fn whoami(OptionalAuth(claims): OptionalAuth) -> Json<Option<Claims>> {
//!     Json(claims)
//! }
//!
//! async fn me(Auth(claims): Auth) -> Json<Claims> {
//!     Json(claims)
//! }
//! ```
//!
//! Both reuse the outcome of the [`authenticate`](super::middleware::authenticate)
//! middleware when it ran, and authenticate on their own otherwise.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::claims::Claims;
use super::error::{NormalizedError, VerificationError};
use super::middleware::Authenticated;
use super::Authenticator;

/// Claims if a token was presented, `None` for anonymous requests.
///
/// A presented but invalid token is still rejected.
pub struct OptionalAuth(pub Option<Claims>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Authenticator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = NormalizedError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(Authenticated(claims)) = parts.extensions.get::<Authenticated>().cloned() {
            return Ok(OptionalAuth(claims));
        }

        let authenticator = Authenticator::from_ref(state);
        let claims = authenticator.authenticate(&parts.headers).await?;
        parts.extensions.insert(Authenticated(claims.clone()));

        Ok(OptionalAuth(claims))
    }
}

/// Claims of a required token. Anonymous requests are rejected with
/// `jwt must be provided`.
pub struct Auth(pub Claims);

impl<S> FromRequestParts<S> for Auth
where
    Authenticator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = NormalizedError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(claims) = OptionalAuth::from_request_parts(parts, state).await?;
        claims
            .map(Auth)
            .ok_or_else(|| VerificationError::MissingToken.normalize())
    }
}
