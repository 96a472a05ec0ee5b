//! Music platform access.
//!
//! [`MusicPlatform`] is the seam between request handling and the Spotify Web
//! API. Every call takes the caller's bearer token; nothing here stores one.

mod client;
pub mod models;
mod user_data;

pub use client::{SpotifyClient, DEFAULT_API_BASE_URL};
pub use user_data::{
    fetch_user_data, PlaylistContents, TopArtist, TopTrack, UserData, UserDataLimits,
};

use crate::enrichment::{TrackLookup, TrackMatch};
use anyhow::{bail, Result};
use async_trait::async_trait;
use models::{PlaylistItem, SpotifyArtist, SpotifyPlaylist, SpotifyTrack};
use std::sync::Arc;

#[async_trait]
pub trait MusicPlatform: Send + Sync {
    async fn top_artists(&self, token: &str, limit: u32) -> Result<Vec<SpotifyArtist>>;

    async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<SpotifyTrack>>;

    async fn playlists(&self, token: &str, limit: u32) -> Result<Vec<SpotifyPlaylist>>;

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        limit: u32,
    ) -> Result<Vec<PlaylistItem>>;

    /// Best single match for `name` by `artist`.
    async fn search_track(&self, token: &str, name: &str, artist: &str)
        -> Result<Option<SpotifyTrack>>;
}

/// Track search on behalf of one caller.
pub struct TokenScopedLookup {
    platform: Arc<dyn MusicPlatform>,
    token: Option<String>,
}

impl TokenScopedLookup {
    pub fn new(platform: Arc<dyn MusicPlatform>, token: Option<String>) -> Self {
        Self { platform, token }
    }
}

#[async_trait]
impl TrackLookup for TokenScopedLookup {
    async fn search_track(&self, name: &str, artist: &str) -> Result<Option<TrackMatch>> {
        let Some(token) = self.token.as_deref() else {
            bail!("No access token to search with");
        };
        let found = self.platform.search_track(token, name, artist).await?;
        Ok(found.map(|track| TrackMatch {
            images: track.album.images.into_iter().map(|img| img.url).collect(),
            genres: track.album.genres,
        }))
    }
}
