//! HTTP client for an OpenAI-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use chorus_council::{CompletionBackend, CompletionRequest, CouncilError};
use chorus_firewall::{ModerationBackend, ModerationError, ModerationVerdict};
use reqwest::{header, Client};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::wire::{parse_completion, parse_moderation, ChatCompletionBody, ModerationBody};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; endpoint paths are appended to it.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model for chat completions.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Completion and moderation client.
///
/// One instance serves both backends; clone it freely, the connection pool
/// is shared.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    config: ClientConfig,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Setup(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for `path` under the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, ProviderError> {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .timeout(self.config.timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let err = ProviderError::from_status(status.as_u16(), &text);
            warn!(url = %url, status = status.as_u16(), "Provider returned an error");
            return Err(err);
        }
        Ok(text)
    }

    /// Requests one chat completion.
    pub async fn chat_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let body = ChatCompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
        };
        debug!(
            model = %self.config.model,
            temperature = request.temperature,
            "POST chat/completions"
        );
        let text = self.post_json("chat/completions", &body).await?;
        parse_completion(&text)
    }

    /// Classifies `input` with the moderation endpoint.
    pub async fn moderation(&self, input: &str) -> Result<ModerationVerdict, ProviderError> {
        debug!(chars = input.chars().count(), "POST moderations");
        let text = self.post_json("moderations", &ModerationBody { input }).await?;
        parse_moderation(&text)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CouncilError> {
        Ok(self.chat_completion(request).await?)
    }
}

#[async_trait]
impl ModerationBackend for OpenAiClient {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, ModerationError> {
        Ok(self.moderation(text).await?)
    }
}
