// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors and their normalized wire form.
//!
//! Every failure of a verification attempt is a [`VerificationError`]. Before
//! it leaves the process it is normalized into a [`NormalizedError`], which
//! carries only `name`, `message` and `statusCode`. Those three fields are
//! the contract existing API clients rely on:
//!
//! | Variant | name | message | status |
//! |---|---|---|---|
//! | `MissingToken` | `JsonWebTokenError` | `jwt must be provided` | 401 |
//! | `MalformedToken` | `JsonWebTokenError` | `jwt malformed` | 401 |
//! | `InvalidSignature` | `JsonWebTokenError` | `invalid signature` | 401 |
//! | `InvalidAlgorithm` | `JsonWebTokenError` | `invalid algorithm` | 401 |
//! | `InvalidClaim` | `JsonWebTokenError` | `invalid <claim> value` | 401 |
//! | `ExpiredToken` | `TokenExpiredError` | `jwt expired` | 401 |
//! | `NotYetValidToken` | `NotBeforeError` | `jwt not active` | 401 |
//! | `KeyFetchFailure` | `KeyFetchError` | cause message | 502 |

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};
use thiserror::Error;

pub const JSON_WEB_TOKEN_ERROR: &str = "JsonWebTokenError";
pub const TOKEN_EXPIRED_ERROR: &str = "TokenExpiredError";
pub const NOT_BEFORE_ERROR: &str = "NotBeforeError";
pub const KEY_FETCH_ERROR: &str = "KeyFetchError";

/// Failure to obtain the public key from the auth server.
#[derive(Debug, Error)]
pub enum KeyFetchError {
    /// Transport-level failure (connection refused, DNS, TLS, ...)
    #[error("public key request failed")]
    Request(#[source] reqwest::Error),
    /// The request did not complete within the configured timeout
    #[error("public key request timed out")]
    Timeout(#[source] reqwest::Error),
    /// Non-2xx response
    #[error("public key endpoint returned HTTP {0}")]
    Status(StatusCode),
    /// Body is not the expected JSON document
    #[error("public key response is not valid JSON")]
    InvalidBody(#[source] serde_json::Error),
    /// `success` was false
    #[error("public key response reported failure")]
    Unsuccessful,
    /// `data.publicKey` absent or empty
    #[error("public key response did not contain a key")]
    MissingKey,
    /// Key material could not be parsed as an asymmetric public key
    #[error("public key is not a supported RSA, EC or Ed25519 PEM")]
    InvalidKey,
}

impl KeyFetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            KeyFetchError::Timeout(err)
        } else {
            KeyFetchError::Request(err)
        }
    }
}

/// Outcome of a failed verification attempt.
#[derive(Debug, Clone, Error)]
pub enum VerificationError {
    /// `Authorization` header present but the token is empty
    #[error("jwt must be provided")]
    MissingToken,
    /// Not a three-segment JWT, or a segment is not valid base64url JSON
    #[error("jwt malformed")]
    MalformedToken,
    /// Signature does not match the public key
    #[error("invalid signature")]
    InvalidSignature,
    /// Token `alg` is not accepted for the public key's family
    #[error("invalid algorithm")]
    InvalidAlgorithm,
    /// A registered time claim is present but not numeric
    #[error("invalid {0} value")]
    InvalidClaim(&'static str),
    /// `exp` is in the past
    #[error("jwt expired")]
    ExpiredToken {
        /// Expiry as seconds since the Unix epoch
        expired_at: i64,
    },
    /// `nbf` is in the future
    #[error("jwt not active")]
    NotYetValidToken {
        /// Activation time as seconds since the Unix epoch
        active_at: i64,
    },
    /// The public key could not be fetched
    #[error("{0}")]
    KeyFetchFailure(Arc<KeyFetchError>),
}

impl VerificationError {
    /// Normalize into the transport-ready shape.
    pub fn normalize(&self) -> NormalizedError {
        let name = match self {
            VerificationError::MissingToken
            | VerificationError::MalformedToken
            | VerificationError::InvalidSignature
            | VerificationError::InvalidAlgorithm
            | VerificationError::InvalidClaim(_) => JSON_WEB_TOKEN_ERROR,
            VerificationError::ExpiredToken { .. } => TOKEN_EXPIRED_ERROR,
            VerificationError::NotYetValidToken { .. } => NOT_BEFORE_ERROR,
            VerificationError::KeyFetchFailure(_) => KEY_FETCH_ERROR,
        };

        NormalizedError {
            name,
            message: self.to_string(),
            status_code: self.status_code(),
        }
    }

    /// HTTP status for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerificationError::KeyFetchFailure(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Whether the failure is the auth server's fault rather than the client's.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, VerificationError::KeyFetchFailure(_))
    }
}

impl From<Arc<KeyFetchError>> for VerificationError {
    fn from(err: Arc<KeyFetchError>) -> Self {
        VerificationError::KeyFetchFailure(err)
    }
}

impl From<KeyFetchError> for VerificationError {
    fn from(err: KeyFetchError) -> Self {
        VerificationError::KeyFetchFailure(Arc::new(err))
    }
}

/// The only error shape that crosses the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{name}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
    pub name: &'static str,
    pub message: String,
    #[serde(serialize_with = "serialize_status")]
    pub status_code: StatusCode,
}

impl From<VerificationError> for NormalizedError {
    fn from(err: VerificationError) -> Self {
        err.normalize()
    }
}

impl From<&VerificationError> for NormalizedError {
    fn from(err: &VerificationError) -> Self {
        err.normalize()
    }
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

impl IntoResponse for NormalizedError {
    fn into_response(self) -> Response {
        let status = self.status_code;
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for VerificationError {
    fn into_response(self) -> Response {
        self.normalize().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::json;

    #[test]
    fn client_errors_match_wire_table() {
        let cases = [
            (VerificationError::MissingToken, JSON_WEB_TOKEN_ERROR, "jwt must be provided"),
            (VerificationError::MalformedToken, JSON_WEB_TOKEN_ERROR, "jwt malformed"),
            (VerificationError::InvalidSignature, JSON_WEB_TOKEN_ERROR, "invalid signature"),
            (VerificationError::InvalidAlgorithm, JSON_WEB_TOKEN_ERROR, "invalid algorithm"),
            (VerificationError::InvalidClaim("exp"), JSON_WEB_TOKEN_ERROR, "invalid exp value"),
            (
                VerificationError::ExpiredToken { expired_at: 1_700_000_000 },
                TOKEN_EXPIRED_ERROR,
                "jwt expired",
            ),
            (
                VerificationError::NotYetValidToken { active_at: 1_700_000_000 },
                NOT_BEFORE_ERROR,
                "jwt not active",
            ),
        ];

        for (err, name, message) in cases {
            let normalized = err.normalize();
            assert_eq!(normalized.name, name);
            assert_eq!(normalized.message, message);
            assert_eq!(normalized.status_code, StatusCode::UNAUTHORIZED);
            assert!(!err.is_infrastructure());
        }
    }

    #[test]
    fn key_fetch_failure_is_bad_gateway_with_cause() {
        let err = VerificationError::from(KeyFetchError::Status(StatusCode::SERVICE_UNAVAILABLE));
        let normalized = err.normalize();

        assert_eq!(normalized.name, KEY_FETCH_ERROR);
        assert_eq!(
            normalized.message,
            "public key endpoint returned HTTP 503 Service Unavailable"
        );
        assert_eq!(normalized.status_code, StatusCode::BAD_GATEWAY);
        assert!(err.is_infrastructure());
    }

    #[test]
    fn serializes_only_name_message_status() {
        let value = serde_json::to_value(VerificationError::MalformedToken.normalize()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "JsonWebTokenError",
                "message": "jwt malformed",
                "statusCode": 401
            })
        );
    }

    #[tokio::test]
    async fn into_response_uses_status_and_json_body() {
        let response = VerificationError::ExpiredToken { expired_at: 0 }.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "TokenExpiredError",
                "message": "jwt expired",
                "statusCode": 401
            })
        );
    }
}
