//! Typed shape check for recovered analysis payloads.

use super::prompt::MAX_TEXT_CHARS;
use super::{AnalysisResult, ToneBlock, ToneSet};
use crate::enrichment::Recommendation;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

pub const REQUIRED_SECTIONS: [&str; 4] = ["tracks", "artists", "playlists", "recommendations"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Model reply is not a JSON object")]
    NotAnObject,

    #[error("Missing required analysis section: {0}")]
    MissingSection(&'static str),

    #[error("Malformed analysis section '{section}': {source}")]
    Malformed {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub fn validate_analysis(value: Value) -> Result<AnalysisResult, ValidationError> {
    let Value::Object(mut sections) = value else {
        return Err(ValidationError::NotAnObject);
    };

    if let Some(missing) = REQUIRED_SECTIONS
        .iter()
        .find(|key| matches!(sections.get(**key), None | Some(Value::Null)))
    {
        return Err(ValidationError::MissingSection(*missing));
    }

    Ok(AnalysisResult {
        tracks: clamp(section::<ToneSet>(&mut sections, "tracks")?),
        artists: clamp(section::<ToneSet>(&mut sections, "artists")?),
        playlists: clamp(section::<ToneSet>(&mut sections, "playlists")?),
        recommendations: section::<Vec<Recommendation>>(&mut sections, "recommendations")?,
    })
}

fn section<T: DeserializeOwned>(
    sections: &mut Map<String, Value>,
    key: &'static str,
) -> Result<T, ValidationError> {
    let raw = sections.remove(key).unwrap_or(Value::Null);
    serde_json::from_value(raw).map_err(|source| ValidationError::Malformed {
        section: key,
        source,
    })
}

fn clamp(set: ToneSet) -> ToneSet {
    ToneSet {
        nice: clamp_block(set.nice),
        funny: clamp_block(set.funny),
        roast: clamp_block(set.roast),
    }
}

fn clamp_block(block: ToneBlock) -> ToneBlock {
    if block.text.chars().count() <= MAX_TEXT_CHARS {
        return block;
    }
    ToneBlock {
        emoji: block.emoji,
        text: block.text.chars().take(MAX_TEXT_CHARS).collect(),
    }
}
