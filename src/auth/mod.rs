// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Local verification of bearer tokens issued by a remote auth server.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>` (or no header at all)
//! 2. Without a header the request is anonymous and no key is needed
//! 3. With a header:
//!    - The auth server's public key is fetched once from
//!      `{server}/auth/public-key` and cached for the process lifetime
//!    - The JWT signature is verified against that key
//!    - `nbf` and `exp` are checked against the current time
//! 4. The caller receives either the claims or a normalized
//!    `{ name, message, statusCode }` error
//!
//! ## Concurrency
//!
//! - At most one key fetch is in flight at any time; concurrent requests
//!   share its outcome
//! - A failed fetch is not retried automatically; the next request tries again

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod key_cache;
pub mod key_fetcher;
pub mod middleware;
pub mod verifier;

pub use authenticator::{bearer_token, Authenticator};
pub use claims::Claims;
pub use error::{KeyFetchError, NormalizedError, VerificationError};
pub use extractor::{Auth, OptionalAuth};
pub use key_cache::KeyCache;
pub use key_fetcher::{KeyFamily, KeyFetcher, PublicKey};
pub use middleware::{authenticate, Authenticated};
pub use verifier::TokenVerifier;
