// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token signature and time-claim verification.
//!
//! Checks run in a fixed order so that the reported failure is deterministic:
//!
//! 1. empty token
//! 2. structure (three segments, decodable header)
//! 3. algorithm, which must belong to the public key's family
//! 4. signature
//! 5. payload JSON
//! 6. `nbf`, then `exp`
//!
//! Time claims are compared against the wall clock at millisecond precision,
//! so a token whose `exp` equals the current second is already expired once
//! any part of that second has passed.

use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::Value;

use super::claims::Claims;
use super::error::VerificationError;
use super::key_fetcher::PublicKey;

/// Verifies raw tokens against a public key. Synchronous and side-effect free.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenVerifier {
    /// Clock skew tolerance in seconds
    leeway: u64,
}

impl TokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerate `leeway` seconds of clock skew on `exp` and `nbf`.
    pub fn with_leeway(leeway: u64) -> Self {
        Self { leeway }
    }

    pub fn leeway(&self) -> u64 {
        self.leeway
    }

    /// Verify `token` against `key` at the current time.
    pub fn verify(&self, token: &str, key: &PublicKey) -> Result<Claims, VerificationError> {
        self.verify_at(token, key, Utc::now())
    }

    /// Verify `token` against `key` as of `now`.
    pub fn verify_at(
        &self,
        token: &str,
        key: &PublicKey,
        now: DateTime<Utc>,
    ) -> Result<Claims, VerificationError> {
        if token.is_empty() {
            return Err(VerificationError::MissingToken);
        }
        if token.split('.').count() != 3 {
            return Err(VerificationError::MalformedToken);
        }
        decode_header(token).map_err(|_| header_error(token))?;

        let token_data =
            decode::<Claims>(token, key.decoding_key(), &signature_only(key)).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
                    ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                        VerificationError::InvalidAlgorithm
                    }
                    _ => VerificationError::MalformedToken,
                }
            })?;

        let claims = token_data.claims;
        check_time_claims(&claims, now, self.leeway)?;
        Ok(claims)
    }
}

/// Classify a header that `jsonwebtoken` could not decode.
///
/// A well-formed JSON header naming an algorithm outside the supported set
/// (`none`, `ES512`, ...) is an algorithm failure; anything else is malformed.
fn header_error(token: &str) -> VerificationError {
    let unsupported_alg = token
        .split('.')
        .next()
        .and_then(|segment| URL_SAFE_NO_PAD.decode(segment).ok())
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .and_then(|header| header.get("alg")?.as_str().map(str::to_owned))
        .is_some_and(|alg| alg.parse::<Algorithm>().is_err());

    if unsupported_alg {
        VerificationError::InvalidAlgorithm
    } else {
        VerificationError::MalformedToken
    }
}

/// Validation that checks the algorithm and signature only. Time claims are
/// checked by [`check_time_claims`] so the offending timestamp can be reported.
fn signature_only(key: &PublicKey) -> Validation {
    let mut validation = Validation::default();
    validation.algorithms = key.family().algorithms().to_vec();
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.leeway = 0;
    validation
}

fn check_time_claims(
    claims: &Claims,
    now: DateTime<Utc>,
    leeway: u64,
) -> Result<(), VerificationError> {
    let now = now.timestamp_millis() as f64 / 1000.0;
    let leeway = leeway as f64;

    if let Some(nbf) = numeric_claim(claims, "nbf")? {
        if now + leeway < nbf {
            return Err(VerificationError::NotYetValidToken {
                active_at: nbf as i64,
            });
        }
    }

    if let Some(exp) = numeric_claim(claims, "exp")? {
        if now - leeway > exp {
            return Err(VerificationError::ExpiredToken {
                expired_at: exp as i64,
            });
        }
    }

    Ok(())
}

fn numeric_claim(claims: &Claims, name: &'static str) -> Result<Option<f64>, VerificationError> {
    match claims.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or(VerificationError::InvalidClaim(name)),
    }
}
