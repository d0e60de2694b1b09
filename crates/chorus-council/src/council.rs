//! Council facade combining the sampler and the consensus selector.
//!
//! The main entry point for response generation: either a full
//! deliberation (sample at every configured temperature, then select) or a
//! single direct completion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{ChatMessage, CompletionBackend};
use crate::consensus::{ConsensusResult, ConsensusSelector};
use crate::sampler::{ResponseSampler, Sample, SampleSet, SamplerConfig};
use crate::Result;

/// Result of a full deliberation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deliberation {
    /// Every sampled candidate, in request order.
    pub samples: SampleSet,
    /// Ranking of the candidates.
    pub consensus: ConsensusResult,
    /// The selected response text.
    pub response: String,
}

/// The council - samples the model and picks the consensus response.
///
/// # Example
///
/// ```rust,ignore
/// let council = Council::new(backend);
/// let deliberation = council.deliberate("What is 2 + 2?", &[], false).await?;
/// println!("{}", deliberation.response);
/// ```
#[derive(Clone)]
pub struct Council {
    sampler: ResponseSampler,
    selector: ConsensusSelector,
}

impl Council {
    /// Creates a council with default sampling and selection.
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self::with_config(backend, SamplerConfig::new())
    }

    /// Creates a council with a custom sampler configuration.
    pub fn with_config(backend: Arc<dyn CompletionBackend>, config: SamplerConfig) -> Self {
        Self::with_components(
            ResponseSampler::with_config(backend, config),
            ConsensusSelector::new(),
        )
    }

    /// Creates a council with custom components.
    pub fn with_components(sampler: ResponseSampler, selector: ConsensusSelector) -> Self {
        Self { sampler, selector }
    }

    pub fn sampler(&self) -> &ResponseSampler {
        &self.sampler
    }

    pub fn selector(&self) -> &ConsensusSelector {
        &self.selector
    }

    /// Samples at every configured temperature and selects the consensus.
    ///
    /// # Errors
    ///
    /// Returns [`CouncilError::EmptySampleSet`](crate::CouncilError::EmptySampleSet)
    /// if the sampler is configured with no temperatures. Completion
    /// failures never surface here; they are candidates like any other.
    pub async fn deliberate(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        use_reasoning_mode: bool,
    ) -> Result<Deliberation> {
        let samples = self.sampler.sample(prompt, history, use_reasoning_mode).await;
        let consensus = self.selector.rank(&samples.texts())?;
        let response = samples.samples()[consensus.winner].text.clone();

        debug!(
            winner = consensus.winner,
            score = consensus.winning_score(),
            "Consensus selected"
        );

        Ok(Deliberation {
            samples,
            consensus,
            response,
        })
    }

    /// Requests a single completion at the given temperature.
    pub async fn respond_once(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        temperature: f64,
        use_reasoning_mode: bool,
    ) -> Sample {
        self.sampler
            .complete_one(prompt, history, temperature, use_reasoning_mode)
            .await
    }
}
