//! # Response Sampler
//!
//! Issues one completion request per sampling temperature and collects the
//! results into a [`SampleSet`].
//!
//! ## Pacing
//!
//! Requests run strictly one after another with a fixed delay between
//! them so a single turn never bursts the remote rate limit. The cost is
//! latency: roughly one pacing interval per extra sample.
//!
//! ```text
//!  t=0.3 ──► complete ──► sleep(pacing) ──► t=0.5 ──► complete ──► sleep ──► t=0.7 ──► complete
//! ```
//!
//! ## Failure Handling
//!
//! A failed request does not abort sampling. Its slot holds
//! `"Error: <detail>"` so the set always has exactly one entry per
//! requested temperature.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{ChatMessage, CompletionBackend, CompletionRequest};

/// System instruction for direct answers.
pub const DIRECT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// System instruction asking for step-by-step reasoning before the conclusion.
pub const REASONING_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
When answering, first break down the problem into steps, \
then provide your reasoning for each step, \
and finally give your conclusion.";

/// Default sampling temperatures, in request order.
pub const DEFAULT_TEMPERATURES: [f64; 3] = [0.3, 0.5, 0.7];

/// Default delay between consecutive sampling requests.
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Configuration for [`ResponseSampler`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use chorus_council::SamplerConfig;
///
/// let config = SamplerConfig::new()
///     .with_temperatures(vec![0.2, 0.9])
///     .with_pacing(Duration::from_millis(250));
/// assert_eq!(config.temperatures.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Temperatures to sample at, in order.
    pub temperatures: Vec<f64>,
    /// Delay between consecutive requests.
    pub pacing: Duration,
}

impl SamplerConfig {
    /// Creates a config with the default temperatures and a one second pacing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temperatures: DEFAULT_TEMPERATURES.to_vec(),
            pacing: DEFAULT_PACING,
        }
    }

    /// Sets the sampling temperatures.
    #[must_use]
    pub fn with_temperatures(mut self, temperatures: Vec<f64>) -> Self {
        self.temperatures = temperatures;
        self
    }

    /// Sets the delay between requests.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One sampled response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Temperature the response was sampled at.
    pub temperature: f64,
    /// Response text, or the encoded error if the request failed.
    pub text: String,
    /// Whether `text` encodes a request failure.
    pub failed: bool,
}

/// Ordered candidate responses for a single turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// All samples in request order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Candidate texts in request order.
    pub fn texts(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples whose request failed.
    pub fn failures(&self) -> usize {
        self.samples.iter().filter(|s| s.failed).count()
    }
}

/// Encodes a completion failure as response text.
pub fn error_response(detail: impl std::fmt::Display) -> String {
    format!("Error: {}", detail)
}

/// Builds the message list for one completion request.
///
/// The system instruction comes first, then the prior conversation, then
/// the new prompt as the final user message.
pub fn build_request(
    prompt: &str,
    history: &[ChatMessage],
    temperature: f64,
    use_reasoning_mode: bool,
) -> CompletionRequest {
    let system = if use_reasoning_mode {
        REASONING_SYSTEM_PROMPT
    } else {
        DIRECT_SYSTEM_PROMPT
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(prompt));

    CompletionRequest {
        messages,
        temperature,
    }
}

/// Samples completions from a [`CompletionBackend`].
#[derive(Clone)]
pub struct ResponseSampler {
    backend: Arc<dyn CompletionBackend>,
    config: SamplerConfig,
}

impl ResponseSampler {
    /// Creates a sampler with the default configuration.
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self::with_config(backend, SamplerConfig::new())
    }

    /// Creates a sampler with a custom configuration.
    pub fn with_config(backend: Arc<dyn CompletionBackend>, config: SamplerConfig) -> Self {
        Self { backend, config }
    }

    /// Returns the sampler configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Requests a single completion.
    ///
    /// Never fails: a backend error becomes `"Error: <detail>"`.
    pub async fn complete_one(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        temperature: f64,
        use_reasoning_mode: bool,
    ) -> Sample {
        let request = build_request(prompt, history, temperature, use_reasoning_mode);
        debug!(
            temperature,
            messages = request.messages.len(),
            "Requesting completion"
        );

        match self.backend.complete(&request).await {
            Ok(text) => Sample {
                temperature,
                text,
                failed: false,
            },
            Err(e) => {
                warn!(temperature, "Completion failed: {}", e);
                Sample {
                    temperature,
                    text: error_response(&e),
                    failed: true,
                }
            }
        }
    }

    /// Samples once per configured temperature.
    pub async fn sample(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        use_reasoning_mode: bool,
    ) -> SampleSet {
        let temperatures = self.config.temperatures.clone();
        self.sample_at(prompt, history, &temperatures, use_reasoning_mode)
            .await
    }

    /// Samples once per given temperature, sequentially and paced.
    pub async fn sample_at(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        temperatures: &[f64],
        use_reasoning_mode: bool,
    ) -> SampleSet {
        let mut samples = Vec::with_capacity(temperatures.len());

        for (i, &temperature) in temperatures.iter().enumerate() {
            if i > 0 && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }
            samples.push(
                self.complete_one(prompt, history, temperature, use_reasoning_mode)
                    .await,
            );
        }

        let set = SampleSet { samples };
        debug!(
            samples = set.len(),
            failures = set.failures(),
            "Sampling complete"
        );
        set
    }
}
