//! Turn request and outcome types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sampling temperature used when responses are not compared.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// One user turn as submitted by a client.
///
/// Every field is optional on the wire. `use_cot` is accepted as an alias
/// for `use_reasoning_mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The user's message.
    #[serde(default)]
    pub message: String,

    /// Ask the model to reason step by step before concluding.
    #[serde(default, alias = "use_cot")]
    pub use_reasoning_mode: bool,

    /// Sample several temperatures and pick the consensus.
    #[serde(default = "default_compare")]
    pub compare_responses: bool,

    /// Temperature for the single completion when not comparing.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_compare() -> bool {
    true
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl Default for TurnRequest {
    fn default() -> Self {
        Self::new("")
    }
}

impl TurnRequest {
    /// A request with the default options.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            use_reasoning_mode: false,
            compare_responses: true,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_reasoning_mode(mut self, enabled: bool) -> Self {
        self.use_reasoning_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_compare_responses(mut self, enabled: bool) -> Self {
        self.compare_responses = enabled;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// The assistant's answer to an accepted turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    /// Text stored as the assistant message. May be the refusal or an
    /// `Error: ...` placeholder.
    pub response: String,
    /// `HH:MM` at which the reply was produced.
    pub timestamp: String,
}

/// Why a turn was rejected. A rejected turn changes no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// The message was empty after trimming whitespace.
    EmptyMessage,

    /// The temperature is not a finite value in `0.0..=2.0`.
    InvalidTemperature { value: String },

    /// Input moderation flagged the message.
    Flagged { categories: BTreeMap<String, bool> },
}

impl Rejection {
    /// Category map for a flagged rejection.
    pub fn categories(&self) -> Option<&BTreeMap<String, bool>> {
        match self {
            Self::Flagged { categories } => Some(categories),
            _ => None,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "Empty message"),
            Self::InvalidTemperature { value } => {
                write!(f, "Invalid temperature: {} (expected 0.0 to 2.0)", value)
            }
            Self::Flagged { .. } => write!(f, "Message flagged by content moderation"),
        }
    }
}

/// Result of one [`send_message`](crate::Chorus::send_message) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The turn was accepted and two messages were appended.
    Reply(TurnReply),
    /// The turn was rejected before anything was recorded.
    Rejected(Rejection),
}

impl TurnOutcome {
    pub fn reply(response: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self::Reply(TurnReply {
            response: response.into(),
            timestamp: timestamp.into(),
        })
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn as_reply(&self) -> Option<&TurnReply> {
        match self {
            Self::Reply(reply) => Some(reply),
            Self::Rejected(_) => None,
        }
    }

    pub fn as_rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Reply(_) => None,
        }
    }
}
