use axum::extract::FromRef;

use crate::analysis::Analyzer;
use crate::auth::{LoginStateStore, SpotifyAuth, TokenStore};
use crate::spotify::MusicPlatform;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedAnalyzer = Arc<Analyzer>;
pub type GuardedMusicPlatform = Arc<dyn MusicPlatform>;
pub type GuardedSpotifyAuth = Arc<SpotifyAuth>;
pub type GuardedTokenStore = Arc<TokenStore>;
pub type GuardedLoginStateStore = Arc<LoginStateStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub analyzer: GuardedAnalyzer,
    pub platform: GuardedMusicPlatform,
    pub spotify_auth: GuardedSpotifyAuth,
    pub token_store: GuardedTokenStore,
    pub login_states: GuardedLoginStateStore,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        analyzer: GuardedAnalyzer,
        platform: GuardedMusicPlatform,
        spotify_auth: GuardedSpotifyAuth,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            analyzer,
            platform,
            spotify_auth,
            token_store: Arc::new(TokenStore::new()),
            login_states: Arc::new(LoginStateStore::new()),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedAnalyzer {
    fn from_ref(input: &ServerState) -> Self {
        input.analyzer.clone()
    }
}

impl FromRef<ServerState> for GuardedMusicPlatform {
    fn from_ref(input: &ServerState) -> Self {
        input.platform.clone()
    }
}

impl FromRef<ServerState> for GuardedSpotifyAuth {
    fn from_ref(input: &ServerState) -> Self {
        input.spotify_auth.clone()
    }
}

impl FromRef<ServerState> for GuardedTokenStore {
    fn from_ref(input: &ServerState) -> Self {
        input.token_store.clone()
    }
}

impl FromRef<ServerState> for GuardedLoginStateStore {
    fn from_ref(input: &ServerState) -> Self {
        input.login_states.clone()
    }
}
