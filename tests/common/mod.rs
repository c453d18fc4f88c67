// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures: a mocked auth server and token signing helpers.

#![allow(dead_code)]

use std::time::Duration;

use authentic_client::auth::Authenticator;
use authentic_client::config::AuthConfig;
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RSA_PRIVATE: &str = include_str!("../fixtures/rsa-private.pem");
pub const RSA_PUBLIC: &str = include_str!("../fixtures/rsa-public.pem");
pub const RSA_OTHER_PRIVATE: &str = include_str!("../fixtures/rsa-other-private.pem");
pub const RSA_OTHER_PUBLIC: &str = include_str!("../fixtures/rsa-other-public.pem");

pub const PUBLIC_KEY_PATH: &str = "/auth/public-key";
pub const EMAIL: &str = "chet@scalehaus.io";
pub const THIRTY_DAYS: i64 = 30 * 24 * 60 * 60;

/// Successful key discovery response for `pem`.
pub fn key_response(pem: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "data": { "publicKey": pem }
    }))
}

/// Matcher for the key discovery endpoint.
pub fn key_endpoint() -> wiremock::MockBuilder {
    Mock::given(method("GET")).and(path(PUBLIC_KEY_PATH))
}

/// Start an auth server that serves the RSA test key and expects `fetches`
/// requests for it.
pub async fn key_server(fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    key_endpoint()
        .respond_with(key_response(RSA_PUBLIC))
        .expect(fetches)
        .mount(&server)
        .await;
    server
}

pub fn config_for(server: &MockServer) -> AuthConfig {
    AuthConfig::new(&server.uri())
        .expect("mock server URI is valid")
        .with_fetch_timeout(Duration::from_secs(5))
}

pub fn authenticator_for(server: &MockServer) -> Authenticator {
    Authenticator::new(&config_for(server))
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn sign_with(pem: &str, claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("valid RSA private key");
    encode(&Header::new(Algorithm::RS256), claims, &key).expect("token signs")
}

pub fn sign(claims: &Value) -> String {
    sign_with(RSA_PRIVATE, claims)
}

/// A token valid for thirty days from now, issued now.
pub fn valid_token() -> String {
    let now = now_secs();
    sign(&json!({ "email": EMAIL, "iat": now, "exp": now + THIRTY_DAYS }))
}

pub fn bearer(token: &str) -> HeaderMap {
    authorization(&format!("Bearer {token}"))
}

pub fn authorization(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(value).expect("valid header value"),
    );
    headers
}
