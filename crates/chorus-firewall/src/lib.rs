//! # Chorus Firewall - Moderation Gate
//!
//! The moderation gate sits on both sides of the model: user input is
//! checked before it reaches the model, and the generated output is checked
//! before it reaches the user.
//!
//! ## Purpose
//!
//! 1. **Input gating** - a flagged user message is rejected with the
//!    categories that triggered, and nothing is recorded.
//!
//! 2. **Output gating** - a flagged completion is replaced by a fixed
//!    refusal before it is shown or stored.
//!
//! ## Failure Model
//!
//! The gate delegates classification to a remote service through
//! [`ModerationBackend`]. When that service fails the gate does not block
//! the conversation:
//!
//! | Fail mode | Verdict on backend failure | Observable as |
//! |-----------|----------------------------|---------------|
//! | `Open` (default) | unflagged, no categories | `warn!` event + [`ModerationGate::fail_open_count`] |
//! | `Closed` | flagged, `moderation_unavailable` | `warn!` event |
//!
//! Fail-open trades safety for availability: a moderation outage silently
//! disables the gate. Operators should watch the fail-open counter.
//!
//! ## Architecture
//!
//! ```text
//!              text
//!               │
//!               ▼
//!     ┌───────────────────┐
//!     │ ModerationBackend │
//!     └─────────┬─────────┘
//!        Ok     │     Err
//!       ┌───────┴───────┐
//!       ▼               ▼
//!    verdict        FailMode
//!                   ├─ Open   → clean verdict, counter += 1
//!                   └─ Closed → flagged (moderation_unavailable)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chorus_firewall::ModerationGate;
//!
//! let gate = ModerationGate::new(backend);
//!
//! let verdict = gate.check("Can you help me with my code?").await;
//! if verdict.is_flagged() {
//!     println!("Rejected: {:?}", verdict.flagged_categories());
//! }
//! ```
//!
//! ## References
//!
//! - OpenAI Moderation API: <https://platform.openai.com/docs/guides/moderation>
//! - OWASP LLM Top 10: <https://owasp.org/www-project-top-10-for-large-language-model-applications/>

pub mod gate;
pub mod models;

pub use gate::{FailMode, GateConfig, ModerationGate};
pub use models::{ModerationBackend, ModerationError, ModerationVerdict, UNAVAILABLE_CATEGORY};
