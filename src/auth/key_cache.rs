// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory public key cache with single-flight fetching.
//!
//! ## Behavior
//!
//! - The first caller moves the cache from `Empty` to `Fetching` and starts
//!   the one network request.
//! - Callers that arrive while a fetch is in flight attach to it and observe
//!   the same key or the same error. During a forced refresh, [`KeyCache::get_key`]
//!   keeps returning the previously cached key instead.
//! - A fetched key is trusted for the lifetime of the process. There is no
//!   TTL; only [`KeyCache::refresh`] replaces it.
//! - A failed fetch resets the cache (to `Empty`, or to the previous key when
//!   the fetch was a forced refresh) so the next caller tries again.

use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use super::error::KeyFetchError;
use super::key_fetcher::{KeyFetcher, PublicKey};

type KeyFlight = Shared<BoxFuture<'static, Result<PublicKey, Arc<KeyFetchError>>>>;

enum CachedKeyState {
    Empty,
    Fetching {
        flight: KeyFlight,
        /// Key to fall back to if a forced refresh fails
        previous: Option<PublicKey>,
    },
    Ready(PublicKey),
}

/// Public key cache shared by all requests.
///
/// Cloning is cheap; clones share the same cached state.
#[derive(Clone)]
pub struct KeyCache {
    fetcher: Arc<KeyFetcher>,
    state: Arc<Mutex<CachedKeyState>>,
}

impl KeyCache {
    pub fn new(fetcher: KeyFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            state: Arc::new(Mutex::new(CachedKeyState::Empty)),
        }
    }

    /// Get the current public key, fetching it if nothing is cached.
    ///
    /// While a forced refresh is in flight the previously cached key is
    /// returned without waiting.
    ///
    /// # Errors
    ///
    /// Returns the fetch error shared by every caller of the failed flight.
    pub async fn get_key(&self) -> Result<PublicKey, Arc<KeyFetchError>> {
        let flight = {
            let mut state = self.lock();
            match &*state {
                CachedKeyState::Ready(key) => return Ok(key.clone()),
                // A forced refresh is running; keep serving the current key.
                CachedKeyState::Fetching {
                    previous: Some(key),
                    ..
                } => return Ok(key.clone()),
                CachedKeyState::Fetching { flight, .. } => flight.clone(),
                CachedKeyState::Empty => {
                    let flight = self.start_flight();
                    *state = CachedKeyState::Fetching {
                        flight: flight.clone(),
                        previous: None,
                    };
                    flight
                }
            }
        };

        self.settle(flight).await
    }

    /// Force a new fetch, replacing the cached key on success.
    ///
    /// Joins the in-flight fetch instead if one is already running.
    pub async fn refresh(&self) -> Result<PublicKey, Arc<KeyFetchError>> {
        let flight = {
            let mut state = self.lock();
            if let CachedKeyState::Fetching { flight, .. } = &*state {
                flight.clone()
            } else {
                let previous = match &*state {
                    CachedKeyState::Ready(key) => Some(key.clone()),
                    _ => None,
                };
                let flight = self.start_flight();
                *state = CachedKeyState::Fetching {
                    flight: flight.clone(),
                    previous,
                };
                flight
            }
        };

        self.settle(flight).await
    }

    /// Whether a key is cached. Never triggers I/O.
    pub fn is_ready(&self) -> bool {
        matches!(&*self.lock(), CachedKeyState::Ready(_))
    }

    /// Whether a fetch is currently in flight.
    pub fn is_fetching(&self) -> bool {
        matches!(&*self.lock(), CachedKeyState::Fetching { .. })
    }

    fn start_flight(&self) -> KeyFlight {
        let fetcher = Arc::clone(&self.fetcher);
        async move {
            fetcher.fetch().await.map_err(|err| {
                tracing::error!(
                    target: "authentic.keys",
                    url = %fetcher.url(),
                    error = %error_chain(&err),
                    "Public key fetch failed"
                );
                Arc::new(err)
            })
        }
        .boxed()
        .shared()
    }

    /// Await a flight and apply its outcome if it is still the current one.
    async fn settle(&self, flight: KeyFlight) -> Result<PublicKey, Arc<KeyFetchError>> {
        let outcome = flight.clone().await;

        let mut state = self.lock();
        let next = match &*state {
            CachedKeyState::Fetching {
                flight: current,
                previous,
            } if current.ptr_eq(&flight) => Some(match &outcome {
                Ok(key) => CachedKeyState::Ready(key.clone()),
                Err(_) => previous
                    .clone()
                    .map_or(CachedKeyState::Empty, CachedKeyState::Ready),
            }),
            _ => None,
        };
        if let Some(next) = next {
            *state = next;
        }

        outcome
    }

    fn lock(&self) -> MutexGuard<'_, CachedKeyState> {
        // The state is replaced wholesale under the lock, so a poisoned guard
        // still holds a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Render an error and every cause below it as `outer: cause: root`.
fn error_chain(err: &dyn Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
