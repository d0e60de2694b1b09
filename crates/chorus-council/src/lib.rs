//! # Chorus Council
//!
//! Multi-sample response generation with similarity-based consensus.
//!
//! ## Overview
//!
//! A single completion at a single temperature is one draw from the model's
//! distribution. The council draws several (one per temperature), then
//! returns the draw that agrees most with the others. A response that is
//! textually central to the cluster is taken as the model's consensus.
//!
//! ## Architecture
//!
//! ```text
//!            prompt + history
//!                   │
//!                   ▼
//!          ┌─────────────────┐
//!          │ ResponseSampler │  one request per temperature, paced
//!          └────────┬────────┘
//!                   │ SampleSet
//!                   ▼
//!         ┌───────────────────┐
//!         │ ConsensusSelector │  mean pairwise similarity, argmax
//!         └────────┬──────────┘
//!                  │
//!                  ▼
//!            chosen response
//! ```
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`similarity`] | Gestalt pattern-matching ratio in `[0, 1]` |
//! | [`ResponseSampler`] | Sequential, paced completion requests |
//! | [`ConsensusSelector`] | Picks the most central candidate |
//! | [`Council`] | Facade over sampler + selector |
//! | [`CompletionBackend`] | Contract for the remote model |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chorus_council::{Council, SamplerConfig};
//!
//! let council = Council::with_config(backend, SamplerConfig::new());
//! let deliberation = council.deliberate("Why is the sky blue?", &history, false).await?;
//! println!("{}", deliberation.response);
//! ```

pub mod backend;
pub mod consensus;
pub mod council;
pub mod error;
pub mod sampler;
pub mod similarity;

pub use backend::{ChatMessage, ChatRole, CompletionBackend, CompletionRequest};
pub use consensus::{ConsensusResult, ConsensusSelector, Scorer};
pub use council::{Council, Deliberation};
pub use error::CouncilError;
pub use sampler::{
    build_request, error_response, ResponseSampler, Sample, SampleSet, SamplerConfig,
    DEFAULT_PACING, DEFAULT_TEMPERATURES, DIRECT_SYSTEM_PROMPT, REASONING_SYSTEM_PROMPT,
};
pub use similarity::similarity;

/// Result type for council operations.
pub type Result<T> = std::result::Result<T, CouncilError>;
