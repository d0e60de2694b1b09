//! # Core Types for the Moderation Gate
//!
//! Verdicts, the backend contract and the error taxonomy shared by the gate
//! and by provider implementations.
//!
//! ## Design Principles
//!
//! 1. **Category detail travels with the verdict** - a flagged input is
//!    rejected with the full category map so the caller can explain why
//! 2. **Verdicts are ephemeral** - produced per call and never stored
//! 3. **Serializable** - verdicts derive Serde traits for responses and logs

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category reported when a fail-closed gate cannot reach its backend.
pub const UNAVAILABLE_CATEGORY: &str = "moderation_unavailable";

/// Result of moderating one piece of text.
///
/// `categories` maps each category name reported by the service to whether
/// it was triggered. An unflagged verdict may still carry the full map.
///
/// # Example
///
/// ```rust
/// use chorus_firewall::ModerationVerdict;
///
/// let verdict = ModerationVerdict::flagged_with([("violence", true), ("hate", false)]);
/// assert!(verdict.flagged);
/// assert_eq!(verdict.flagged_categories(), vec!["violence"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Whether the text was flagged.
    pub flagged: bool,
    /// Category name to triggered flag.
    pub categories: BTreeMap<String, bool>,
}

impl ModerationVerdict {
    /// An unflagged verdict with no category detail.
    pub fn clean() -> Self {
        Self::default()
    }

    /// A flagged verdict with the given categories.
    pub fn flagged_with<I, K>(categories: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        Self {
            flagged: true,
            categories: categories.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Whether the text was flagged.
    #[inline]
    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// Names of the triggered categories, alphabetically.
    pub fn flagged_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|(_, hit)| **hit)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Errors a moderation backend can report.
///
/// The gate never propagates these; they decide between fail-open and
/// fail-closed handling.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// The service could not be reached or answered with an error status.
    #[error("Moderation service unavailable: {0}")]
    Unavailable(String),

    /// The service answered but the body could not be interpreted.
    #[error("Invalid moderation response: {0}")]
    InvalidResponse(String),
}

/// A remote content-moderation service.
#[async_trait]
pub trait ModerationBackend: Send + Sync {
    /// Classifies `text`.
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, ModerationError>;
}
