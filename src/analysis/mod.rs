//! Listening-profile analysis.
//!
//! A [`ListeningProfile`] is summarized into a prompt, sent to the completion
//! backend, and the reply is recovered, enriched and validated into an
//! [`AnalysisResult`].

mod error;
mod orchestrator;
pub mod prompt;
pub mod validate;

pub use error::AnalysisError;
pub use orchestrator::Analyzer;
pub use validate::{validate_analysis, ValidationError};

use crate::enrichment::Recommendation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const UNNAMED_PLAYLIST: &str = "Unnamed Playlist";
pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub name: String,
    pub artist: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub name: String,
    pub artist: String,
    pub popularity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<PlaylistTrack>,
}

/// What the user listens to, as submitted for analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ListeningProfile {
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Error, PartialEq)]
pub enum InvalidProfile {
    #[error("Request body is not a JSON object")]
    NotAnObject,
    #[error("Field '{0}' must be an array")]
    NotAnArray(&'static str),
}

impl ListeningProfile {
    /// Builds a profile from a request body.
    ///
    /// Absent lists are empty; a list field holding anything but an array,
    /// `null` included, is rejected. Top artists and tracks without a name are
    /// skipped; playlist entries fall back to placeholder names instead.
    pub fn from_json(body: &Value) -> Result<Self, InvalidProfile> {
        let body = body.as_object().ok_or(InvalidProfile::NotAnObject)?;

        let artists = list_field(body, "artists")?
            .iter()
            .filter_map(|a| text_field(a, "name"))
            .map(|name| Artist { name })
            .collect();

        let tracks = list_field(body, "tracks")?
            .iter()
            .filter_map(|t| {
                let name = text_field(t, "name")?;
                let artist = text_field(t, "artist").unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
                Some(Track { name, artist })
            })
            .collect();

        let playlists = list_field(body, "playlists")?
            .iter()
            .map(playlist_from_json)
            .collect();

        Ok(ListeningProfile {
            artists,
            tracks,
            playlists,
        })
    }
}

fn list_field<'a>(
    body: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a [Value], InvalidProfile> {
    match body.get(key) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(InvalidProfile::NotAnArray(key)),
    }
}

fn playlist_from_json(value: &Value) -> Playlist {
    let tracks = value
        .get("tracks")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|t| PlaylistTrack {
                    name: text_field(t, "name").unwrap_or_else(|| UNKNOWN_TRACK.to_string()),
                    artist: text_field(t, "artist").unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                    popularity: t
                        .get("popularity")
                        .and_then(Value::as_u64)
                        .map(|p| p.min(u32::MAX as u64) as u32)
                        .unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    Playlist {
        name: text_field(value, "name").unwrap_or_else(|| UNNAMED_PLAYLIST.to_string()),
        tracks,
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// One short take on a listening category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneBlock {
    #[serde(default)]
    pub emoji: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneSet {
    pub nice: ToneBlock,
    pub funny: ToneBlock,
    pub roast: ToneBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tracks: ToneSet,
    pub artists: ToneSet,
    pub playlists: ToneSet,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_lists_default_to_empty() {
        let profile = ListeningProfile::from_json(&json!({})).unwrap();
        assert_eq!(profile, ListeningProfile::default());

        let profile = ListeningProfile::from_json(&json!({"tracks": []})).unwrap();
        assert!(profile.tracks.is_empty());
    }

    #[test]
    fn null_lists_are_rejected() {
        assert_eq!(
            ListeningProfile::from_json(&json!({"artists": null, "tracks": []})),
            Err(InvalidProfile::NotAnArray("artists"))
        );
    }

    #[test]
    fn non_array_fields_are_rejected() {
        assert_eq!(
            ListeningProfile::from_json(&json!({"artists": "Radiohead"})),
            Err(InvalidProfile::NotAnArray("artists"))
        );
        assert_eq!(
            ListeningProfile::from_json(&json!({"playlists": {"name": "x"}})),
            Err(InvalidProfile::NotAnArray("playlists"))
        );
        assert_eq!(
            ListeningProfile::from_json(&json!([1, 2])),
            Err(InvalidProfile::NotAnObject)
        );
    }

    #[test]
    fn missing_names_fall_back() {
        let body = json!({
            "artists": [{"name": "Björk"}, {}, null],
            "tracks": [{"name": "Hyperballad"}, {"artist": "nobody"}],
            "playlists": [
                {"tracks": [{}, {"name": "Joga", "artist": "Björk", "popularity": 61}]},
                {"name": "Empty"}
            ]
        });

        let profile = ListeningProfile::from_json(&body).unwrap();

        assert_eq!(profile.artists, vec![Artist { name: "Björk".into() }]);
        assert_eq!(
            profile.tracks,
            vec![Track {
                name: "Hyperballad".into(),
                artist: UNKNOWN_ARTIST.into()
            }]
        );
        assert_eq!(profile.playlists[0].name, UNNAMED_PLAYLIST);
        assert_eq!(
            profile.playlists[0].tracks[0],
            PlaylistTrack {
                name: UNKNOWN_TRACK.into(),
                artist: UNKNOWN_ARTIST.into(),
                popularity: 0
            }
        );
        assert_eq!(profile.playlists[0].tracks[1].popularity, 61);
        assert!(profile.playlists[1].tracks.is_empty());
    }
}
