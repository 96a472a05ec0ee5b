//! HTTP client for the Spotify Web API.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::models::{
    Paging, PlaylistItem, SearchResponse, SpotifyArtist, SpotifyPlaylist, SpotifyTrack,
};
use super::MusicPlatform;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Time window used for the user's top items.
const TOP_ITEMS_TIME_RANGE: &str = "short_term";

pub struct SpotifyClient {
    client: reqwest::Client,
    base_url: String,
}

impl SpotifyClient {
    /// Create a new Web API client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the Web API (e.g., "https://api.spotify.com/v1")
    /// * `timeout` - Deadline applied to every request
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create Spotify HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Spotify request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach Spotify at {}", path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Spotify {} failed with status {}: {}", path, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse Spotify response for {}", path))
    }
}

#[async_trait]
impl MusicPlatform for SpotifyClient {
    async fn top_artists(&self, token: &str, limit: u32) -> Result<Vec<SpotifyArtist>> {
        let page: Paging<SpotifyArtist> = self
            .get_json(
                token,
                "/me/top/artists",
                &[
                    ("time_range", TOP_ITEMS_TIME_RANGE.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<SpotifyTrack>> {
        let page: Paging<SpotifyTrack> = self
            .get_json(
                token,
                "/me/top/tracks",
                &[
                    ("time_range", TOP_ITEMS_TIME_RANGE.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    async fn playlists(&self, token: &str, limit: u32) -> Result<Vec<SpotifyPlaylist>> {
        let page: Paging<SpotifyPlaylist> = self
            .get_json(token, "/me/playlists", &[("limit", limit.to_string())])
            .await?;
        Ok(page.items)
    }

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        limit: u32,
    ) -> Result<Vec<PlaylistItem>> {
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        let page: Paging<PlaylistItem> = self
            .get_json(token, &path, &[("limit", limit.to_string())])
            .await?;
        Ok(page.items)
    }

    async fn search_track(
        &self,
        token: &str,
        name: &str,
        artist: &str,
    ) -> Result<Option<SpotifyTrack>> {
        let q = format!("{} {}", name, artist).trim().to_string();
        let response: SearchResponse = self
            .get_json(
                token,
                "/search",
                &[
                    ("q", q),
                    ("type", "track".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(response.tracks.items.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer tok")
    }

    async fn spawn_stub() -> String {
        let router = Router::new()
            .route(
                "/v1/me/top/artists",
                get(
                    |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                        assert!(authorized(&headers));
                        assert_eq!(q["time_range"], "short_term");
                        assert_eq!(q["limit"], "5");
                        Json(json!({"items": [{"name": "Low", "images": [], "genres": ["slowcore"]}]}))
                    },
                ),
            )
            .route(
                "/v1/me/playlists",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q["limit"], "5");
                    Json(json!({"items": [{"id": "p1", "name": "Mix", "images": null}]}))
                }),
            )
            .route(
                "/v1/playlists/{id}/tracks",
                get(|Path(id): Path<String>| async move {
                    if id == "gone" {
                        return StatusCode::NOT_FOUND.into_response();
                    }
                    Json(json!({"items": [{"track": {"name": "Lullaby", "artists": [{"name": "Low"}], "popularity": 40}}, {"track": null}]}))
                        .into_response()
                }),
            )
            .route(
                "/v1/search",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q["type"], "track");
                    assert_eq!(q["limit"], "1");
                    if q["q"] == "Nothing Here" {
                        return Json(json!({"tracks": {"items": []}}));
                    }
                    Json(json!({"tracks": {"items": [{
                        "name": "Words",
                        "artists": [{"name": "Low"}],
                        "album": {"images": [{"url": "https://img/words", "height": 640}]}
                    }]}}))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1/", addr)
    }

    async fn client() -> SpotifyClient {
        SpotifyClient::new(spawn_stub().await, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_top_artists() {
        let artists = client().await.top_artists("tok", 5).await.unwrap();
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].genres, vec!["slowcore".to_string()]);
    }

    #[tokio::test]
    async fn fetches_playlists_and_their_tracks() {
        let client = client().await;
        let playlists = client.playlists("tok", 5).await.unwrap();
        assert_eq!(playlists[0].id, "p1");
        assert!(playlists[0].images.is_empty());

        let items = client.playlist_tracks("tok", "p1", 50).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].track.as_ref().unwrap().popularity, 40);
        assert!(items[1].track.is_none());
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let err = client()
            .await
            .playlist_tracks("tok", "gone", 50)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn search_returns_first_hit_or_none() {
        let client = client().await;
        let hit = client.search_track("tok", "Words", "Low").await.unwrap().unwrap();
        assert_eq!(hit.album.images[0].url, "https://img/words");

        assert!(client
            .search_track("tok", "Nothing", "Here")
            .await
            .unwrap()
            .is_none());
    }
}
