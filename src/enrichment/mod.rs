//! Enrichment of model-suggested recommendations with catalog data.
//!
//! Each suggestion is looked up once on the music platform. A match brings in
//! artwork and a genre; anything else falls back to a placeholder record, so
//! the output always has one entry per suggestion, in the same order.

use async_trait::async_trait;
use futures::future::join_all;
use crate::analysis::{UNKNOWN_ARTIST, UNKNOWN_TRACK};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/300x300?text=Album+Art";
pub const UNKNOWN_GENRE: &str = "Unknown";

/// A song suggested by the model, before any lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecommendationCandidate {
    /// `None` when the model gave no usable name; such entries are not searched.
    pub name: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
}

impl RecommendationCandidate {
    /// Reads one entry of the model's `recommendations` array. Anything that
    /// is not a non-empty string is treated as absent, so this never fails.
    pub fn from_json(entry: &Value) -> Self {
        RecommendationCandidate {
            name: text_field(entry, "name"),
            artist: text_field(entry, "artist"),
            genre: text_field(entry, "genre"),
        }
    }

    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| UNKNOWN_TRACK.to_string())
    }

    fn display_artist(&self) -> String {
        self.artist.clone().unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub artist: String,
    pub image: String,
    pub genre: String,
}

impl Recommendation {
    /// Record used when a candidate could not be resolved.
    pub fn placeholder(candidate: &RecommendationCandidate) -> Self {
        Recommendation {
            name: candidate.display_name(),
            artist: candidate.display_artist(),
            image: PLACEHOLDER_IMAGE_URL.to_string(),
            genre: candidate
                .genre
                .clone()
                .unwrap_or_else(|| UNKNOWN_GENRE.to_string()),
        }
    }
}

/// Best match for a track search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackMatch {
    /// Artwork URLs, largest first.
    pub images: Vec<String>,
    pub genres: Vec<String>,
}

/// Track search, already bound to whatever credentials it needs.
#[async_trait]
pub trait TrackLookup: Send + Sync {
    async fn search_track(&self, name: &str, artist: &str) -> anyhow::Result<Option<TrackMatch>>;
}

/// Resolves a single candidate. `None` means no usable match.
pub async fn enrich(
    candidate: &RecommendationCandidate,
    lookup: &dyn TrackLookup,
) -> Option<Recommendation> {
    let Some(name) = candidate.name.as_deref() else {
        debug!("Recommendation has no name, skipping lookup");
        crate::metrics::record_enrichment_lookup("skipped");
        return None;
    };
    let artist = candidate.artist.as_deref().unwrap_or_default();

    match lookup.search_track(name, artist).await {
        Ok(Some(found)) => {
            crate::metrics::record_enrichment_lookup("match");
            Some(Recommendation {
                name: name.to_string(),
                artist: candidate.display_artist(),
                image: found
                    .images
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
                genre: found
                    .genres
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| UNKNOWN_GENRE.to_string()),
            })
        }
        Ok(None) => {
            debug!(track = %name, artist = %artist, "No match for recommendation");
            crate::metrics::record_enrichment_lookup("miss");
            None
        }
        Err(err) => {
            warn!(
                track = %name,
                artist = %artist,
                "Recommendation lookup failed: {:#}",
                err
            );
            crate::metrics::record_enrichment_lookup("error");
            None
        }
    }
}

/// Resolves all candidates concurrently. Output order matches input order.
pub async fn enrich_all(
    candidates: &[RecommendationCandidate],
    lookup: &dyn TrackLookup,
) -> Vec<Recommendation> {
    let lookups = candidates.iter().map(|candidate| async move {
        enrich(candidate, lookup)
            .await
            .unwrap_or_else(|| Recommendation::placeholder(candidate))
    });
    join_all(lookups).await
}
