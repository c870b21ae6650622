//! Token caching and refresh
//!
//! [`TokenManager`] owns the cached bearer token for one client instance.
//! It fetches lazily, discards on [`invalidate`](TokenManager::invalidate),
//! and deduplicates concurrent fetches: callers arriving while a fetch is
//! in flight await the same shared result instead of issuing their own.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::registry::auth::{Auth, Token};

type PendingFetch = Shared<BoxFuture<'static, Result<Token>>>;

#[derive(Default)]
struct State {
    cached: Option<Token>,
    pending: Option<PendingFetch>,
}

/// Owns the token state for a single client; never process-global, so two
/// client instances cannot share tokens implicitly.
#[derive(Clone)]
pub struct TokenManager {
    auth: Auth,
    log: Logger,
    state: Arc<Mutex<State>>,
}

impl TokenManager {
    pub fn new(auth: Auth, log: Logger) -> Self {
        Self {
            auth,
            log,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Return a currently-valid token, fetching one if the cache is empty,
    /// invalidated, or expired.
    ///
    /// At most one fetch is outstanding at a time; every caller that
    /// arrives while it is in flight resolves from the same result.
    pub async fn get_token(&self) -> Result<Token> {
        let fetch = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| Error::Transport("token state lock poisoned".to_string()))?;

            if let Some(token) = &state.cached {
                if token.is_fresh() {
                    return Ok(token.clone());
                }
                // Expired tokens are discarded, never patched up.
                self.log.debug("cached token expired, refreshing");
                state.cached = None;
            }

            match &state.pending {
                Some(pending) => pending.clone(),
                None => {
                    let fetch = self.spawn_fetch();
                    state.pending = Some(fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Drop the cached token so the next `get_token` fetches a fresh one.
    /// Idempotent; does not itself fetch.
    pub fn invalidate(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.cached = None;
        }
    }

    /// Start a token fetch in its own task. A caller that is cancelled
    /// mid-flight must not abort the fetch other waiters resolve from, so
    /// the fetch does not run on any caller's future.
    fn spawn_fetch(&self) -> PendingFetch {
        let auth = self.auth.clone();
        let state = Arc::clone(&self.state);
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = auth.fetch_token().await;
            if let Ok(mut state) = state.lock() {
                state.pending = None;
                if let Ok(token) = &result {
                    state.cached = Some(token.clone());
                }
            }
            // Waiters may all be gone; that is not an error.
            let _ = tx.send(result);
        });

        rx.map(|received| match received {
            Ok(result) => result,
            Err(_) => Err(Error::Transport(
                "token fetch task dropped before completing".to_string(),
            )),
        })
        .boxed()
        .shared()
    }
}
