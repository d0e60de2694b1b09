//! Configuration types for Chorus.
//!
//! Every section and field has a default, so an empty TOML file (or none at
//! all) yields a runnable configuration. The API credential is never stored
//! here: only the name of the environment variable that holds it.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use chorus_council::{SamplerConfig, DEFAULT_TEMPERATURES};
use chorus_firewall::{FailMode, GateConfig};

use crate::conversation::ContextWindow;
use crate::error::ChorusError;
use crate::session::{SessionStore, DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS};
use crate::Result;

/// Refusal shown in place of a flagged completion.
pub const DEFAULT_REFUSAL: &str =
    "I apologize, but I cannot provide that response as it may contain inappropriate content.";

/// Highest sampling temperature accepted by the provider.
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChorusConfig {
    /// Remote model provider.
    pub provider: ProviderConfig,

    /// Response sampling.
    pub sampler: SamplerSettings,

    /// Moderation gate.
    pub moderation: ModerationConfig,

    /// Conversation context sent to the model.
    pub history: HistoryConfig,

    /// HTTP service.
    pub server: ServerConfig,
}

/// Remote model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,

    /// Model identifier sent with every completion request.
    pub model: String,

    /// Environment variable holding the API credential.
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Response sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Temperatures sampled when comparing responses, in request order.
    pub temperatures: Vec<f64>,

    /// Delay between sampling requests, in milliseconds.
    pub pacing_ms: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            temperatures: DEFAULT_TEMPERATURES.to_vec(),
            pacing_ms: 1000,
        }
    }
}

/// Moderation gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Consult the moderation service at all.
    pub enabled: bool,

    /// What a moderation outage means. `open` lets text through.
    pub fail_mode: FailMode,

    /// Text stored and shown instead of a flagged completion.
    pub refusal_message: String,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_mode: FailMode::Open,
            refusal_message: DEFAULT_REFUSAL.to_string(),
        }
    }
}

/// Context window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Most recent prior messages sent to the model. `0` sends all of them.
    pub max_context_messages: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_context_messages: 20,
        }
    }
}

/// HTTP service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,

    /// Most sessions held in memory at once.
    pub max_sessions: usize,

    /// Seconds a session may sit unused before it is dropped. `0` keeps
    /// sessions until evicted by `max_sessions`.
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_idle_secs: DEFAULT_IDLE_TTL.as_secs(),
        }
    }
}

impl ServerConfig {
    /// Idle TTL, or `None` when sessions never expire.
    pub fn session_idle_ttl(&self) -> Option<Duration> {
        match self.session_idle_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Whether `value` is a temperature the provider accepts.
pub fn is_valid_temperature(value: f64) -> bool {
    value.is_finite() && (0.0..=MAX_TEMPERATURE).contains(&value)
}

impl ChorusConfig {
    /// Parses a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Loads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value that would otherwise fail at request time.
    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ChorusError::Config("provider.base_url is empty".into()));
        }
        if self.provider.model.trim().is_empty() {
            return Err(ChorusError::Config("provider.model is empty".into()));
        }
        if self.provider.api_key_env.trim().is_empty() {
            return Err(ChorusError::Config("provider.api_key_env is empty".into()));
        }
        if self.sampler.temperatures.is_empty() {
            return Err(ChorusError::Config(
                "sampler.temperatures must list at least one value".into(),
            ));
        }
        if let Some(bad) = self
            .sampler
            .temperatures
            .iter()
            .find(|t| !is_valid_temperature(**t))
        {
            return Err(ChorusError::Config(format!(
                "sampler.temperatures contains {}, expected 0.0..={}",
                bad, MAX_TEMPERATURE
            )));
        }
        if self.moderation.refusal_message.trim().is_empty() {
            return Err(ChorusError::Config(
                "moderation.refusal_message is empty".into(),
            ));
        }
        if self.server.max_sessions == 0 {
            return Err(ChorusError::Config(
                "server.max_sessions must be at least 1".into(),
            ));
        }
        self.server
            .bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| {
                ChorusError::Config(format!(
                    "server.bind_addr '{}' is invalid: {}",
                    self.server.bind_addr, e
                ))
            })?;
        Ok(())
    }

    /// Reads the API credential from the process environment.
    ///
    /// # Errors
    ///
    /// [`ChorusError::MissingCredential`] if the variable is unset or blank.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Reads the API credential through `lookup`.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let name = &self.provider.api_key_env;
        match lookup(name) {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ChorusError::MissingCredential(name.clone())),
        }
    }

    /// Sampler configuration derived from these settings.
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig::new()
            .with_temperatures(self.sampler.temperatures.clone())
            .with_pacing(Duration::from_millis(self.sampler.pacing_ms))
    }

    /// Gate configuration derived from these settings.
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            enabled: self.moderation.enabled,
            fail_mode: self.moderation.fail_mode,
        }
    }

    /// Context window derived from these settings.
    pub fn context_window(&self) -> ContextWindow {
        ContextWindow::new(self.history.max_context_messages)
    }

    /// Empty session store bounded by the server settings.
    pub fn session_store(&self) -> SessionStore {
        SessionStore::with_limits(self.server.max_sessions, self.server.session_idle_ttl())
    }
}
