//! Spotify login: authorize redirect, code exchange, token refresh.

mod spotify_auth;
mod token_store;

pub use spotify_auth::{
    SpotifyAuth, SpotifyCredentials, TokenGrant, DEFAULT_ACCOUNTS_BASE_URL, SCOPES,
};
pub use token_store::{TokenRecord, TokenStore};

use rand::{distr::Alphanumeric, Rng};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Pending logins older than this are discarded.
pub const LOGIN_STATE_TTL_SECS: i64 = 300;

const STATE_LENGTH: usize = 32;

/// Generates an unguessable `state` value for the authorize redirect.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Logins started with `/login` and not yet completed, keyed by `state`.
pub struct LoginStateStore {
    states: RwLock<HashMap<String, i64>>,
}

impl LoginStateStore {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, state: String) {
        let now = chrono::Utc::now().timestamp();
        let mut states = self.states.write().await;
        states.retain(|_, created_at| now - *created_at < LOGIN_STATE_TTL_SECS);
        states.insert(state, now);
    }

    /// Consumes `state`. Returns false if it is unknown or expired.
    pub async fn take(&self, state: &str) -> bool {
        let now = chrono::Utc::now().timestamp();
        let mut states = self.states.write().await;
        states
            .remove(state)
            .is_some_and(|created_at| now - created_at < LOGIN_STATE_TTL_SECS)
    }
}

impl Default for LoginStateStore {
    fn default() -> Self {
        Self::new()
    }
}
