use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::{validate_analysis, AnalysisError, AnalysisResult, ListeningProfile};
use crate::enrichment::{enrich_all, RecommendationCandidate, TrackLookup};
use crate::llm::{CompletionOptions, LlmProvider, Prompt};
use crate::recovery::recover;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs the prompt, completion, recovery, enrichment and validation steps
/// for one profile.
pub struct Analyzer {
    provider: Arc<dyn LlmProvider>,
    options: CompletionOptions,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, options: CompletionOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub async fn analyze(
        &self,
        profile: &ListeningProfile,
        lookup: &dyn TrackLookup,
    ) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        let result = self.run(profile, lookup).await;
        match &result {
            Ok(analysis) => {
                info!(
                    recommendations = analysis.recommendations.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Analysis completed"
                );
                crate::metrics::record_analysis_outcome("success");
            }
            Err(err) => {
                warn!(kind = err.kind(), "Analysis failed: {}", err);
                if let Some(raw) = err.raw_reply() {
                    debug!(raw, "Unrecoverable model reply");
                }
                crate::metrics::record_analysis_outcome(err.kind());
            }
        }
        result
    }

    async fn run(
        &self,
        profile: &ListeningProfile,
        lookup: &dyn TrackLookup,
    ) -> Result<AnalysisResult, AnalysisError> {
        let prompt = Prompt::new(SYSTEM_PROMPT, build_prompt(profile));

        debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            "Requesting analysis"
        );
        let completion = self.provider.complete(&prompt, &self.options).await?;
        if completion.truncated {
            warn!(
                max_tokens = ?self.options.max_tokens,
                "Model reply hit the token limit, attempting recovery"
            );
        }

        let recovered = match recover(&completion.text) {
            Ok(recovered) => recovered,
            Err(err) if completion.truncated => return Err(AnalysisError::Truncated(err)),
            Err(err) => return Err(err.into()),
        };
        debug!(
            stage = ?recovered.stage,
            total_tokens = ?completion.total_tokens,
            "Model reply recovered"
        );
        let mut value = recovered.value;

        let candidates = match value.get("recommendations") {
            Some(Value::Array(entries)) => Some(
                entries
                    .iter()
                    .map(RecommendationCandidate::from_json)
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        };
        if let Some(candidates) = candidates {
            let enriched = enrich_all(&candidates, lookup).await;
            value["recommendations"] =
                serde_json::to_value(enriched).map_err(AnalysisError::Recommendations)?;
        }

        Ok(validate_analysis(value)?)
    }
}
