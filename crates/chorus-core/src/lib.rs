//! # Chorus Core
//!
//! Conversation orchestration for a moderated, consensus-sampling chat
//! assistant. Ties the Council (sampling and selection) to the Firewall
//! (moderation gate) and owns conversation history.
//!
//! ## Turn Flow
//!
//! | Step | Component | On failure |
//! |------|-----------|------------|
//! | Validate | [`Chorus`] | Reject, history untouched |
//! | Gate input | [`ModerationGate`] | Reject with categories |
//! | Generate | [`Council`] | `Error: ...` becomes the reply |
//! | Gate output | [`ModerationGate`] | Refusal replaces the reply |
//! | Record | [`Conversation`] | n/a |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       CHORUS CORE                        │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │   SessionStore ──► Conversation ◄── Chorus (facade)      │
//! │                                       │                  │
//! │                         ┌─────────────┴─────────────┐    │
//! │                         ▼                           ▼    │
//! │                  ┌─────────────┐            ┌───────────┐│
//! │                  │   Council   │            │ Moderation││
//! │                  │ sample+rank │            │   Gate    ││
//! │                  └─────────────┘            └───────────┘│
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chorus_core::{Chorus, ChorusConfig, SessionStore, TurnRequest};
//!
//! let config = ChorusConfig::load("chorus.toml")?;
//! let chorus = Chorus::new(completions, moderation, &config);
//! let sessions = SessionStore::new();
//!
//! let outcome = chorus
//!     .send_to_session(&sessions, "session-1", &TurnRequest::new("Hello"))
//!     .await;
//! ```
//!
//! ## Notes
//!
//! - Moderation fails open by default: an outage lets text through and is
//!   counted by [`ModerationGate::fail_open_count`]
//! - Turns within one session are serialized by the session's mutex
//! - History lives in memory and grows until cleared; only the request
//!   context is windowed
//! - Sessions are created only for turns that pass validation and input
//!   moderation, and the store drops idle and least recently used ones

mod config;
mod conversation;
mod error;
mod orchestrator;
mod session;
mod turn;

pub use config::{
    is_valid_temperature, ChorusConfig, HistoryConfig, ModerationConfig, ProviderConfig,
    SamplerSettings, ServerConfig, DEFAULT_REFUSAL, MAX_TEMPERATURE,
};
pub use conversation::{timestamp_now, ContextWindow, Conversation, Message, Role};
pub use error::ChorusError;
pub use orchestrator::{Chorus, Clock};
pub use session::{
    new_session_id, SessionHandle, SessionStore, DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS,
};
pub use turn::{Rejection, TurnOutcome, TurnReply, TurnRequest, DEFAULT_TEMPERATURE};

// Re-export component types for convenience
pub use chorus_council::{CompletionBackend, Council, SamplerConfig};
pub use chorus_firewall::{FailMode, ModerationBackend, ModerationGate, ModerationVerdict};

/// Core result type for chorus operations.
pub type Result<T> = std::result::Result<T, ChorusError>;

#[cfg(test)]
mod tests;
