//! Aggregation of a user's listening data.

use super::models::{pick_image, PlaylistItem, SpotifyPlaylist};
use super::MusicPlatform;
use crate::analysis::{PlaylistTrack, UNKNOWN_ARTIST, UNKNOWN_TRACK, UNNAMED_PLAYLIST};
use crate::collector::{collect_all_with_deadline, Degradable};
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct UserDataLimits {
    pub playlists: u32,
    pub playlist_tracks: u32,
    pub top_items: u32,
    pub playlist_fetch_timeout: Duration,
}

impl Default for UserDataLimits {
    fn default() -> Self {
        Self {
            playlists: 5,
            playlist_tracks: 50,
            top_items: 5,
            playlist_fetch_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopArtist {
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopTrack {
    pub name: String,
    pub artist: String,
    pub image: Option<String>,
}

/// A playlist with its tracks, or a failure marker when they could not be
/// fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistContents {
    pub name: String,
    pub image: Option<String>,
    pub tracks: Vec<PlaylistTrack>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl Degradable<SpotifyPlaylist> for PlaylistContents {
    fn degraded(playlist: &SpotifyPlaylist) -> Self {
        PlaylistContents {
            name: playlist_name(playlist),
            image: pick_image(&playlist.images),
            tracks: vec![],
            error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub top_artists: Vec<TopArtist>,
    pub top_tracks: Vec<TopTrack>,
    pub playlists: Vec<PlaylistContents>,
}

fn playlist_name(playlist: &SpotifyPlaylist) -> String {
    playlist
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNNAMED_PLAYLIST.to_string())
}

fn playlist_track(item: PlaylistItem) -> PlaylistTrack {
    let Some(track) = item.track else {
        return PlaylistTrack {
            name: UNKNOWN_TRACK.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            popularity: 0,
        };
    };
    PlaylistTrack {
        artist: track
            .first_artist()
            .unwrap_or(UNKNOWN_ARTIST)
            .to_string(),
        name: track
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_TRACK.to_string()),
        popularity: track.popularity,
    }
}

/// Fetches the playlist list, then every playlist's tracks alongside the top
/// artists and tracks.
///
/// A playlist whose tracks fail to load is kept with `error: true`. Failing
/// to load the playlist list or either top list fails the whole call.
pub async fn fetch_user_data(
    platform: &dyn MusicPlatform,
    token: &str,
    limits: &UserDataLimits,
) -> Result<UserData> {
    let playlists = platform
        .playlists(token, limits.playlists)
        .await
        .context("Failed to fetch playlists")?;

    let track_limit = limits.playlist_tracks;
    let (contents, artists, tracks) = tokio::join!(
        collect_all_with_deadline(&playlists, limits.playlist_fetch_timeout, |playlist| {
            let id = playlist.id.clone();
            let name = playlist_name(playlist);
            let image = pick_image(&playlist.images);
            async move {
                let items = platform.playlist_tracks(token, &id, track_limit).await?;
                Ok::<_, anyhow::Error>(PlaylistContents {
                    name,
                    image,
                    tracks: items.into_iter().map(playlist_track).collect(),
                    error: false,
                })
            }
        }),
        platform.top_artists(token, limits.top_items),
        platform.top_tracks(token, limits.top_items),
    );

    let top_artists = artists
        .context("Failed to fetch top artists")?
        .into_iter()
        .map(|a| TopArtist {
            image: pick_image(&a.images),
            name: a.name,
        })
        .collect();

    let top_tracks = tracks
        .context("Failed to fetch top tracks")?
        .into_iter()
        .map(|t| TopTrack {
            artist: t.first_artist().unwrap_or(UNKNOWN_ARTIST).to_string(),
            image: pick_image(&t.album.images),
            name: t.name.unwrap_or_else(|| UNKNOWN_TRACK.to_string()),
        })
        .collect();

    let failed = contents.iter().filter(|p| p.error).count();
    info!(
        playlists = contents.len(),
        failed_playlists = failed,
        "Fetched user data"
    );

    Ok(UserData {
        top_artists,
        top_tracks,
        playlists: contents,
    })
}
