//! Spotify Web API response types.
//!
//! Only the fields this server reads are modelled. Collections that the API
//! may send as `null` deserialize as empty.

use serde::{Deserialize, Deserializer, Serialize};

/// Preferred artwork edge length in pixels.
pub const PREFERRED_IMAGE_HEIGHT: u32 = 300;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paging<T> {
    #[serde(default)]
    pub items: Vec<T>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpotifyImage {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpotifyArtist {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<SpotifyImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SimplifiedArtist {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Default, Deserialize, Serialize)]
pub struct SpotifyAlbum {
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<SpotifyImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpotifyTrack {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub album: SpotifyAlbum,
    #[serde(default, deserialize_with = "null_as_default")]
    pub popularity: u32,
}

impl SpotifyTrack {
    pub fn first_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<SpotifyImage>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SearchResponse {
    pub tracks: Paging<SpotifyTrack>,
}

/// The 300px image when there is one, otherwise the first.
pub fn pick_image(images: &[SpotifyImage]) -> Option<String> {
    images
        .iter()
        .find(|img| img.height == Some(PREFERRED_IMAGE_HEIGHT))
        .or_else(|| images.first())
        .map(|img| img.url.clone())
}
