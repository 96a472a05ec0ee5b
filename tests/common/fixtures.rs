//! Test doubles for the outbound services
//!
//! The completion backend and the Spotify Web API are replaced by in-process
//! fakes. The accounts service is a real HTTP stub, since `SpotifyAuth`
//! talks to it over the wire.

use super::constants::*;
use aesthetics_server::llm::{Completion, CompletionOptions, LlmError, LlmProvider, Prompt};
use aesthetics_server::spotify::models::{
    PlaylistItem, SpotifyArtist, SpotifyPlaylist, SpotifyTrack,
};
use aesthetics_server::spotify::MusicPlatform;
use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::{http::StatusCode, routing::post, Form, Json, Router};
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;

const TONES: &str = r#"{"nice": {"emoji": "😊", "text": "Great taste"}, "funny": {"emoji": "😂", "text": "Very loud"}, "roast": {"emoji": "🔥", "text": "Sad boy hours"}}"#;

/// A well-formed model reply with the given `recommendations` JSON.
pub fn analysis_reply(recommendations: &str) -> String {
    format!(
        r#"{{"tracks": {TONES}, "artists": {TONES}, "playlists": {TONES}, "recommendations": {recommendations}}}"#
    )
}

/// The reply used when a test does not care about the model output.
pub fn default_reply() -> String {
    analysis_reply(&format!(
        r#"[{{"name": "{KNOWN_TRACK}", "artist": "{KNOWN_TRACK_ARTIST}", "genre": "rock"}}, {{"name": "Nobody Knows This", "artist": "Nobody", "genre": "ambient"}}]"#
    ))
}

/// Completion backend that answers every request with the same text.
pub struct ScriptedProvider {
    reply: String,
}

impl ScriptedProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(
        &self,
        _prompt: &Prompt,
        _options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        Ok(Completion {
            text: self.reply.clone(),
            truncated: false,
            total_tokens: None,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

/// Spotify Web API fake holding a small fixed library.
pub struct InMemoryPlatform {
    artists: Vec<SpotifyArtist>,
    tracks: Vec<SpotifyTrack>,
    playlists: Vec<SpotifyPlaylist>,
}

fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).expect("Invalid fixture")
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self {
            artists: from_json(json!([
                {
                    "name": "Slowdive",
                    "images": [
                        {"url": "https://img.test/slowdive-640.jpg", "height": 640},
                        {"url": "https://img.test/slowdive-300.jpg", "height": 300}
                    ],
                    "genres": ["shoegaze"]
                },
                {"name": "Low", "images": null}
            ])),
            tracks: from_json(json!([
                {
                    "name": "Alison",
                    "artists": [{"name": "Slowdive"}],
                    "album": {"images": [{"url": "https://img.test/souvlaki.jpg", "height": 640}]},
                    "popularity": 61
                }
            ])),
            playlists: from_json(json!([
                {
                    "id": "p-morning",
                    "name": "Morning",
                    "images": [
                        {"url": "https://img.test/playlist-640.jpg", "height": 640},
                        {"url": PLAYLIST_300_IMAGE, "height": 300}
                    ]
                },
                {"id": "p-broken", "name": BROKEN_PLAYLIST_NAME, "images": []},
                {"id": "p-unnamed", "name": null, "images": null}
            ])),
        }
    }

    fn authorize(token: &str) -> Result<()> {
        if token != TEST_ACCESS_TOKEN {
            bail!("Spotify API returned status 401 Unauthorized");
        }
        Ok(())
    }
}

#[async_trait]
impl MusicPlatform for InMemoryPlatform {
    async fn top_artists(&self, token: &str, limit: u32) -> Result<Vec<SpotifyArtist>> {
        Self::authorize(token)?;
        Ok(self.artists.iter().take(limit as usize).cloned().collect())
    }

    async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<SpotifyTrack>> {
        Self::authorize(token)?;
        Ok(self.tracks.iter().take(limit as usize).cloned().collect())
    }

    async fn playlists(&self, token: &str, limit: u32) -> Result<Vec<SpotifyPlaylist>> {
        Self::authorize(token)?;
        Ok(self.playlists.iter().take(limit as usize).cloned().collect())
    }

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        _limit: u32,
    ) -> Result<Vec<PlaylistItem>> {
        Self::authorize(token)?;
        match playlist_id {
            "p-broken" => bail!("Spotify API returned status 500 Internal Server Error"),
            "p-unnamed" => Ok(vec![]),
            _ => Ok(from_json(json!([
                {"track": {"name": "Alison", "artists": [{"name": "Slowdive"}], "popularity": 61}},
                {"track": null}
            ]))),
        }
    }

    async fn search_track(
        &self,
        token: &str,
        name: &str,
        _artist: &str,
    ) -> Result<Option<SpotifyTrack>> {
        Self::authorize(token)?;
        if name != KNOWN_TRACK {
            return Ok(None);
        }
        Ok(Some(from_json(json!({
            "name": KNOWN_TRACK,
            "artists": [{"name": KNOWN_TRACK_ARTIST}],
            "album": {"images": [{"url": KNOWN_TRACK_IMAGE}], "genres": [KNOWN_TRACK_GENRE]}
        }))))
    }
}

/// Starts a stand-in for the accounts service token endpoint and returns its
/// base URL plus a shutdown handle.
pub async fn spawn_accounts_stub() -> (String, tokio::sync::oneshot::Sender<()>) {
    let router = Router::new().route(
        "/api/token",
        post(|Form(form): Form<HashMap<String, String>>| async move {
            let grant_type = form.get("grant_type").map(String::as_str);
            match grant_type {
                Some("authorization_code")
                    if form.get("code").map(String::as_str) == Some(GOOD_AUTH_CODE) =>
                {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "access_token": GRANTED_ACCESS_TOKEN,
                            "refresh_token": GRANTED_REFRESH_TOKEN,
                            "expires_in": 3600,
                            "token_type": "Bearer"
                        })),
                    )
                }
                Some("refresh_token")
                    if form.get("refresh_token").map(String::as_str)
                        == Some(GRANTED_REFRESH_TOKEN) =>
                {
                    (
                        StatusCode::OK,
                        Json(json!({"access_token": REFRESHED_ACCESS_TOKEN, "expires_in": 3600})),
                    )
                }
                _ => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "invalid_grant"})),
                ),
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind accounts stub");
    let addr = listener.local_addr().expect("Failed to get local address");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Accounts stub failed");
    });

    (format!("http://{}", addr), shutdown_tx)
}
