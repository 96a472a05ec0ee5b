//! Recovery of structured data from unreliable model output.
//!
//! [`recover`] tries, in order:
//! 1. a strict parse of the raw text;
//! 2. a strict parse after the [`stages::NORMALIZERS`] transforms;
//! 3. a JSON5 parse of the outermost `{...}` of the normalized text, then of
//!    the raw text. JSON5 tolerates unquoted keys, single quotes, comments and
//!    trailing commas.
//!
//! Shape validation is left to the caller.

pub mod stages;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Which step of the cascade produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    Direct,
    Normalized,
    Extracted,
}

impl RecoveryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStage::Direct => "direct",
            RecoveryStage::Normalized => "normalized",
            RecoveryStage::Extracted => "extracted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub value: Value,
    pub stage: RecoveryStage,
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    /// No strategy produced valid structured data.
    #[error("Could not extract valid JSON from model output")]
    Unrecoverable { raw: String },
}

impl RecoveryError {
    /// The text that could not be recovered.
    pub fn raw(&self) -> &str {
        match self {
            RecoveryError::Unrecoverable { raw } => raw,
        }
    }
}

pub fn recover(raw: &str) -> Result<Recovered, RecoveryError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Ok(recovered(value, RecoveryStage::Direct));
    }

    let normalized = stages::normalize(raw);
    match serde_json::from_str::<Value>(&normalized.text) {
        Ok(value) => {
            debug!(applied = ?normalized.applied, "Normalizers repaired the reply");
            return Ok(recovered(value, RecoveryStage::Normalized));
        }
        Err(err) => debug!(
            applied = ?normalized.applied,
            error = %err,
            "Normalized text is still not valid JSON"
        ),
    }

    for candidate in [normalized.text.as_str(), raw] {
        let Some(object) = stages::extract_object(candidate) else {
            continue;
        };
        match json5::from_str::<Value>(object) {
            Ok(value) => return Ok(recovered(value, RecoveryStage::Extracted)),
            Err(err) => debug!(error = %err, "JSON5 parse failed"),
        }
    }

    Err(RecoveryError::Unrecoverable {
        raw: raw.to_string(),
    })
}

fn recovered(value: Value, stage: RecoveryStage) -> Recovered {
    debug!(stage = stage.as_str(), "Recovered structured data");
    crate::metrics::record_recovery_stage(stage.as_str());
    Recovered { value, stage }
}
