// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! The authenticator needs a single required option: the base URL of the
//! authentication server that publishes the token signing key. Everything
//! else has a default.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH_SERVER` | Base URL of the authentication server | Required |
//! | `AUTH_FETCH_TIMEOUT_SECS` | Timeout for the public key request | `10` |
//! | `AUTH_CLOCK_LEEWAY_SECS` | Tolerance for `exp`/`nbf` checks | `0` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Environment variable holding the authentication server base URL.
pub const AUTH_SERVER_ENV: &str = "AUTH_SERVER";

/// Environment variable holding the key fetch timeout in whole seconds.
pub const AUTH_FETCH_TIMEOUT_ENV: &str = "AUTH_FETCH_TIMEOUT_SECS";

/// Environment variable holding the clock leeway in whole seconds.
pub const AUTH_CLOCK_LEEWAY_ENV: &str = "AUTH_CLOCK_LEEWAY_SECS";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Path of the key discovery endpoint, relative to the server base URL.
pub const PUBLIC_KEY_PATH: &str = "auth/public-key";

/// Default timeout for the public key request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AUTH_SERVER is required")]
    MissingServer,
    #[error("invalid auth server URL: {0}")]
    InvalidServer(#[from] url::ParseError),
    #[error("auth server URL must use http or https, got `{0}`")]
    UnsupportedScheme(String),
    #[error("{name} must be a whole number of seconds, got `{value}`")]
    InvalidSeconds { name: &'static str, value: String },
}

/// Authenticator configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    server: Url,
    public_key_url: Url,
    fetch_timeout: Duration,
    leeway: u64,
}

impl AuthConfig {
    /// Create a configuration for the given auth server base URL.
    ///
    /// # Arguments
    /// - `server`: e.g. `http://auth.example.com`
    pub fn new(server: &str) -> Result<Self, ConfigError> {
        let mut server = Url::parse(server)?;
        if !matches!(server.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(server.scheme().to_string()));
        }

        // `Url::join` replaces the last path segment unless the base ends in '/'.
        if !server.path().ends_with('/') {
            let path = format!("{}/", server.path());
            server.set_path(&path);
        }
        let public_key_url = server.join(PUBLIC_KEY_PATH)?;

        Ok(Self {
            server,
            public_key_url,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            leeway: 0,
        })
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = lookup(AUTH_SERVER_ENV)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingServer)?;
        let mut config = Self::new(server.trim())?;

        if let Some(secs) = parse_seconds(&lookup, AUTH_FETCH_TIMEOUT_ENV)? {
            config = config.with_fetch_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_seconds(&lookup, AUTH_CLOCK_LEEWAY_ENV)? {
            config = config.with_leeway(secs);
        }

        Ok(config)
    }

    /// Set the timeout for the public key request.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the clock skew tolerance, in seconds, for `exp` and `nbf`.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// The normalized server base URL (always ends with `/`).
    pub fn server(&self) -> &Url {
        &self.server
    }

    /// Full URL of the key discovery endpoint.
    pub fn public_key_url(&self) -> &Url {
        &self.public_key_url
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn leeway(&self) -> u64 {
        self.leeway
    }
}

fn parse_seconds<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidSeconds { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn public_key_url_is_derived_from_server() {
        let config = AuthConfig::new("http://auth.example.com").unwrap();
        assert_eq!(
            config.public_key_url().as_str(),
            "http://auth.example.com/auth/public-key"
        );
        assert_eq!(config.fetch_timeout(), DEFAULT_FETCH_TIMEOUT);
        assert_eq!(config.leeway(), 0);
    }

    #[test]
    fn base_path_is_preserved() {
        let config = AuthConfig::new("https://example.com/api").unwrap();
        assert_eq!(
            config.public_key_url().as_str(),
            "https://example.com/api/auth/public-key"
        );

        let config = AuthConfig::new("https://example.com/api/").unwrap();
        assert_eq!(
            config.public_key_url().as_str(),
            "https://example.com/api/auth/public-key"
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = AuthConfig::new("ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn rejects_unparseable_url() {
        assert!(matches!(
            AuthConfig::new("not a url"),
            Err(ConfigError::InvalidServer(_))
        ));
    }

    #[test]
    fn from_lookup_requires_server() {
        let err = AuthConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingServer));

        let err = AuthConfig::from_lookup(lookup_from(&[(AUTH_SERVER_ENV, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingServer));
    }

    #[test]
    fn from_lookup_reads_optional_durations() {
        let config = AuthConfig::from_lookup(lookup_from(&[
            (AUTH_SERVER_ENV, "http://localhost:4000"),
            (AUTH_FETCH_TIMEOUT_ENV, "3"),
            (AUTH_CLOCK_LEEWAY_ENV, "30"),
        ]))
        .unwrap();

        assert_eq!(config.fetch_timeout(), Duration::from_secs(3));
        assert_eq!(config.leeway(), 30);
        assert_eq!(config.server().as_str(), "http://localhost:4000/");
    }

    #[test]
    fn from_lookup_rejects_bad_durations() {
        let err = AuthConfig::from_lookup(lookup_from(&[
            (AUTH_SERVER_ENV, "http://localhost:4000"),
            (AUTH_FETCH_TIMEOUT_ENV, "ten"),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidSeconds { name: AUTH_FETCH_TIMEOUT_ENV, .. }
        ));
    }
}
