//! Provider error types and HTTP status classification.

use chorus_council::CouncilError;
use chorus_firewall::ModerationError;
use thiserror::Error;

/// Longest slice of an error body kept in messages.
const BODY_EXCERPT_CHARS: usize = 240;

/// Broad class of a non-success HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Authentication,
    Authorization,
    RateLimited,
    InvalidRequest,
    Upstream,
}

impl StatusClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            403 => Self::Authorization,
            408 | 429 => Self::RateLimited,
            400..=499 => Self::InvalidRequest,
            _ => Self::Upstream,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication failed",
            Self::Authorization => "authorization failed",
            Self::RateLimited => "rate limited",
            Self::InvalidRequest => "request rejected",
            Self::Upstream => "provider error",
        }
    }
}

/// Errors talking to the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Setup(String),

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("{} (status {status}){}", .class.as_str(), excerpt_suffix(.body))]
    Http {
        status: u16,
        class: StatusClass,
        body: String,
    },

    /// The body was not the expected JSON shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The body parsed but carried no usable result.
    #[error("response missing {0}")]
    MissingContent(&'static str),
}

fn excerpt_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

impl ProviderError {
    /// Builds an [`ProviderError::Http`] from a status and raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::Http {
            status,
            class: StatusClass::from_status(status),
            body: body.trim().chars().take(BODY_EXCERPT_CHARS).collect(),
        }
    }

    /// Whether the provider was reached but refused or failed the request.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<ProviderError> for CouncilError {
    fn from(err: ProviderError) -> Self {
        CouncilError::Completion(err.to_string())
    }
}

impl From<ProviderError> for ModerationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Decode(_) | ProviderError::MissingContent(_) => {
                ModerationError::InvalidResponse(err.to_string())
            }
            _ => ModerationError::Unavailable(err.to_string()),
        }
    }
}
