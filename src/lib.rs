// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentic Client - bearer token authentication for Axum services
//!
//! Verifies JWTs locally against the public key of a remote authentication
//! server. The key is fetched once, on demand, and shared by all requests.
//!
//! ## Modules
//!
//! - `auth` - Key fetching and caching, token verification, error normalization
//! - `config` - Runtime configuration
//! - `api` - Example HTTP handlers (Axum) hosting the authenticator
//!
//! ## Example
//!
//! ```rust,no_run
//! use authentic_client::{auth::Authenticator, config::AuthConfig};
//! use axum::http::HeaderMap;
//!
//! # async fn run(headers: HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::new("http://auth.example.com")?;
//! let authenticator = Authenticator::new(&config);
//!
//! match authenticator.authenticate(&headers).await {
//!     Ok(Some(claims)) => println!("authenticated: {:?}", claims.email()),
//!     Ok(None) => println!("anonymous"),
//!     Err(err) => println!("{} ({})", err.message, err.status_code),
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod state;
