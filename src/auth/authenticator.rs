// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request authentication: header extraction, key lookup, verification.

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::instrument;

use super::claims::Claims;
use super::error::{NormalizedError, VerificationError};
use super::key_cache::KeyCache;
use super::key_fetcher::{KeyFetcher, PublicKey};
use super::verifier::TokenVerifier;
use crate::config::AuthConfig;

/// Authenticates requests against the auth server's public key.
///
/// Cloning is cheap; clones share the key cache.
#[derive(Clone)]
pub struct Authenticator {
    keys: KeyCache,
    verifier: TokenVerifier,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            keys: KeyCache::new(KeyFetcher::from_config(config)),
            verifier: TokenVerifier::with_leeway(config.leeway()),
        }
    }

    pub fn key_cache(&self) -> &KeyCache {
        &self.keys
    }

    /// Authenticate a request by its headers.
    ///
    /// - No `Authorization` header: anonymous, `Ok(None)`, no key lookup.
    /// - Header present: `Ok(Some(claims))` if the token verifies, otherwise
    ///   the normalized error.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<Claims>, NormalizedError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            tracing::debug!(target: "authentic.verify", "Anonymous request");
            return Ok(None);
        };

        self.authenticate_header(value)
            .await
            .map(Some)
            .map_err(NormalizedError::from)
    }

    /// Verify a present `Authorization` header value.
    pub async fn authenticate_header(&self, value: &HeaderValue) -> Result<Claims, VerificationError> {
        match value.to_str() {
            Ok(value) => self.verify_token(bearer_token(value)).await,
            Err(_) => {
                tracing::debug!(target: "authentic.verify", "Authorization header is not visible ASCII");
                Err(VerificationError::MalformedToken)
            }
        }
    }

    /// Verify a raw token, fetching the public key if it is not cached yet.
    #[instrument(skip_all, name = "authentic.verify_token")]
    pub async fn verify_token(&self, token: &str) -> Result<Claims, VerificationError> {
        let key = self.current_key().await?;

        self.verifier.verify(token, &key).inspect_err(|err| {
            tracing::debug!(target: "authentic.verify", error = %err, "Token rejected");
        })
    }

    /// Force a re-fetch of the public key.
    pub async fn refresh_key(&self) -> Result<PublicKey, VerificationError> {
        self.keys.refresh().await.map_err(VerificationError::from)
    }

    async fn current_key(&self) -> Result<PublicKey, VerificationError> {
        self.keys.get_key().await.map_err(|err| {
            // Full cause was logged when the fetch failed; only the summary
            // travels further.
            tracing::warn!(target: "authentic.verify", error = %err, "Cannot verify token without public key");
            VerificationError::from(err)
        })
    }
}

/// Extract the token from an `Authorization` header value.
///
/// `Bearer <token>` yields `<token>` (scheme matched case-insensitively), a
/// bare `Bearer` yields the empty token, and anything else is taken verbatim.
pub fn bearer_token(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> Authenticator {
        let config = AuthConfig::new("http://127.0.0.1:9").unwrap();
        Authenticator::new(&config)
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(bearer_token("bearer abc"), "abc");
        assert_eq!(bearer_token("Bearer   abc  "), "abc");
        assert_eq!(bearer_token("Bearer "), "");
        assert_eq!(bearer_token("Bearer"), "");
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), "Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token("abc.def.ghi"), "abc.def.ghi");
        assert_eq!(bearer_token("Bearerabc"), "Bearerabc");
    }

    #[tokio::test]
    async fn anonymous_request_skips_key_lookup() {
        let auth = authenticator();
        let result = auth.authenticate(&HeaderMap::new()).await;

        assert_eq!(result, Ok(None));
        assert!(!auth.key_cache().is_ready());
        assert!(!auth.key_cache().is_fetching());
    }

    #[tokio::test]
    async fn non_ascii_header_is_malformed() {
        let auth = authenticator();
        let value = HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap();

        let result = auth.authenticate_header(&value).await;
        assert!(matches!(result, Err(VerificationError::MalformedToken)));
    }
}
