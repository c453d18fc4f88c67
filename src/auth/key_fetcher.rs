// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public key retrieval from the authentication server.
//!
//! The auth server publishes its token signing key at
//! `GET {server}/auth/public-key`:
//!
//! ```json
//! { "success": true, "data": { "publicKey": "-----BEGIN PUBLIC KEY-----\n..." } }
//! ```
//!
//! [`KeyFetcher`] performs exactly one request per call and never retries.
//! Caching and single-flight coordination live in [`super::KeyCache`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::error::KeyFetchError;
use crate::config::AuthConfig;

/// Asymmetric key family, which fixes the accepted signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    /// Algorithms a token may declare when verified with a key of this family.
    pub fn algorithms(self) -> &'static [Algorithm] {
        match self {
            KeyFamily::Rsa => &[
                Algorithm::RS256,
                Algorithm::RS384,
                Algorithm::RS512,
                Algorithm::PS256,
                Algorithm::PS384,
                Algorithm::PS512,
            ],
            KeyFamily::Ec => &[Algorithm::ES256, Algorithm::ES384],
            KeyFamily::Ed => &[Algorithm::EdDSA],
        }
    }
}

struct KeyMaterial {
    pem: String,
    decoding_key: DecodingKey,
    family: KeyFamily,
}

/// Parsed public key. Immutable and cheap to clone.
#[derive(Clone)]
pub struct PublicKey(Arc<KeyMaterial>);

impl PublicKey {
    /// Parse PEM-encoded public key material.
    ///
    /// The key family is detected from the PEM itself; symmetric secrets are
    /// never accepted.
    pub fn from_pem(pem: &str) -> Result<Self, KeyFetchError> {
        let bytes = pem.as_bytes();
        let (decoding_key, family) = if let Ok(key) = DecodingKey::from_rsa_pem(bytes) {
            (key, KeyFamily::Rsa)
        } else if let Ok(key) = DecodingKey::from_ec_pem(bytes) {
            (key, KeyFamily::Ec)
        } else if let Ok(key) = DecodingKey::from_ed_pem(bytes) {
            (key, KeyFamily::Ed)
        } else {
            return Err(KeyFetchError::InvalidKey);
        };

        Ok(Self(Arc::new(KeyMaterial {
            pem: pem.to_string(),
            decoding_key,
            family,
        })))
    }

    pub fn pem(&self) -> &str {
        &self.0.pem
    }

    pub fn family(&self) -> KeyFamily {
        self.0.family
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.0.decoding_key
    }

    /// Whether both handles refer to the same fetched key.
    pub fn same_key(&self, other: &PublicKey) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("family", &self.0.family)
            .finish_non_exhaustive()
    }
}

/// Body of the key discovery endpoint.
#[derive(Debug, Deserialize)]
struct PublicKeyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<PublicKeyData>,
}

#[derive(Debug, Deserialize)]
struct PublicKeyData {
    #[serde(default, rename = "publicKey")]
    public_key: Option<String>,
}

impl PublicKeyResponse {
    fn into_pem(self) -> Result<String, KeyFetchError> {
        if !self.success {
            return Err(KeyFetchError::Unsuccessful);
        }
        self.data
            .and_then(|data| data.public_key)
            .filter(|pem| !pem.trim().is_empty())
            .ok_or(KeyFetchError::MissingKey)
    }
}

/// Fetches the public key from the auth server. Stateless.
#[derive(Debug, Clone)]
pub struct KeyFetcher {
    url: Url,
    client: reqwest::Client,
}

impl KeyFetcher {
    /// Create a fetcher for the given key endpoint.
    pub fn new(url: Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "authentic.keys", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self { url, client }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.public_key_url().clone(), config.fetch_timeout())
    }

    /// Key endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Perform a single GET against the key endpoint and parse the key.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-2xx status, unparseable body, `success:
    /// false`, missing key or unsupported key material.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<PublicKey, KeyFetchError> {
        tracing::debug!(target: "authentic.keys", "Fetching public key from auth server");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(KeyFetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyFetchError::Status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(KeyFetchError::from_reqwest)?;
        let parsed: PublicKeyResponse =
            serde_json::from_slice(&body).map_err(KeyFetchError::InvalidBody)?;
        let key = PublicKey::from_pem(&parsed.into_pem()?)?;

        tracing::info!(
            target: "authentic.keys",
            family = ?key.family(),
            "Public key fetched"
        );

        Ok(key)
    }
}
