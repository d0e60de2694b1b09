//! Moderation gate facade
//!
//! Wraps a [`ModerationBackend`] and turns every outcome, including backend
//! failure, into a [`ModerationVerdict`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{ModerationBackend, ModerationVerdict, UNAVAILABLE_CATEGORY};

/// What the gate answers when the backend fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailMode {
    /// Treat the text as unflagged. An outage silently disables the gate.
    #[default]
    Open,
    /// Treat the text as flagged under [`UNAVAILABLE_CATEGORY`].
    Closed,
}

/// Gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Whether to consult the backend at all
    pub enabled: bool,
    /// Behaviour on backend failure
    pub fail_mode: FailMode,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_mode: FailMode::Open,
        }
    }
}

/// The moderation gate - main interface
pub struct ModerationGate {
    backend: Arc<dyn ModerationBackend>,
    config: GateConfig,
    fail_opens: AtomicU64,
}

impl ModerationGate {
    /// Create a gate with default config (enabled, fail-open)
    pub fn new(backend: Arc<dyn ModerationBackend>) -> Self {
        Self::with_config(backend, GateConfig::default())
    }

    /// Create a gate with custom config
    pub fn with_config(backend: Arc<dyn ModerationBackend>, config: GateConfig) -> Self {
        Self {
            backend,
            config,
            fail_opens: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Number of backend failures answered with a clean verdict
    pub fn fail_open_count(&self) -> u64 {
        self.fail_opens.load(Ordering::Relaxed)
    }

    /// Moderate `text`. Never fails.
    pub async fn check(&self, text: &str) -> ModerationVerdict {
        if !self.config.enabled {
            return ModerationVerdict::clean();
        }

        match self.backend.moderate(text).await {
            Ok(verdict) => {
                if verdict.flagged {
                    debug!(categories = ?verdict.flagged_categories(), "Text flagged");
                }
                verdict
            }
            Err(e) => match self.config.fail_mode {
                FailMode::Open => {
                    let count = self.fail_opens.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        fail_open_count = count,
                        "Moderation failed, allowing text through: {}", e
                    );
                    ModerationVerdict::clean()
                }
                FailMode::Closed => {
                    warn!("Moderation failed, rejecting text: {}", e);
                    ModerationVerdict::flagged_with([(UNAVAILABLE_CATEGORY, true)])
                }
            },
        }
    }
}
