//! Process-wide record of the last granted Spotify token.

use super::TokenGrant;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct TokenState {
    record: Option<TokenRecord>,
    /// Bumped on every write, so a waiting refresher can tell it was beaten.
    generation: u64,
}

/// Holds the token record behind a lock. Refreshes are single-flight:
/// concurrent callers share the result of one refresh.
#[derive(Debug, Default)]
pub struct TokenStore {
    state: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the record with a freshly granted token.
    pub async fn store(&self, grant: TokenGrant) -> TokenRecord {
        let record = TokenRecord {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: expiry(grant.expires_in),
        };
        let mut state = self.state.write().await;
        state.record = Some(record.clone());
        state.generation += 1;
        info!(expires_at = %record.expires_at, "Stored new access token");
        record
    }

    /// Refreshes the stored token using `refresh` and returns the new access
    /// token. If another caller finished a refresh while this one waited and
    /// that token is still valid, it is returned and `refresh` is never called.
    pub async fn refresh<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<TokenGrant>>,
    {
        let seen = self.state.read().await.generation;
        let _guard = self.refresh_lock.lock().await;

        let refresh_token = {
            let state = self.state.read().await;
            let record = state
                .record
                .as_ref()
                .ok_or_else(|| anyhow!("No token has been stored yet"))?;
            if state.generation != seen && !record.is_expired() {
                debug!("Token was refreshed while waiting, reusing it");
                return Ok(record.access_token.clone());
            }
            record
                .refresh_token
                .clone()
                .ok_or_else(|| anyhow!("Stored token has no refresh token"))?
        };

        let grant = refresh(refresh_token.clone()).await?;

        let mut state = self.state.write().await;
        let record = TokenRecord {
            access_token: grant.access_token,
            // The accounts service only sometimes rotates the refresh token.
            refresh_token: grant.refresh_token.or(Some(refresh_token)),
            expires_at: expiry(grant.expires_in),
        };
        let access_token = record.access_token.clone();
        state.record = Some(record);
        state.generation += 1;
        info!("Access token refreshed");
        Ok(access_token)
    }
}

/// Upper bound on a token lifetime, whatever the grant claims.
const MAX_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

fn expiry(expires_in: u64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(expires_in.min(MAX_TOKEN_LIFETIME_SECS) as i64)
}
