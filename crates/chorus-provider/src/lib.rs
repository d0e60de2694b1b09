//! # Chorus Provider
//!
//! Talks to an OpenAI-compatible HTTP API. [`OpenAiClient`] implements both
//! [`CompletionBackend`](chorus_council::CompletionBackend) and
//! [`ModerationBackend`](chorus_firewall::ModerationBackend).
//!
//! | Endpoint | Request | Used field |
//! |----------|---------|------------|
//! | `POST {base}/chat/completions` | `{model, messages, temperature}` | `choices[0].message.content` |
//! | `POST {base}/moderations` | `{input}` | `results[0].flagged`, `results[0].categories` |
//!
//! Non-success statuses are classified (authentication, authorization, rate
//! limit, invalid request, upstream) and carry a bounded excerpt of the
//! response body. Nothing is retried.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{ClientConfig, OpenAiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{ProviderError, StatusClass};
