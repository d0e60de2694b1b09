//! Chorus service wiring: configuration loading, provider construction and
//! the HTTP router used by the `chorus` binary.

pub mod server;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chorus_core::{Chorus, ChorusConfig};
use chorus_provider::{ClientConfig, OpenAiClient};

pub use server::{router, spawn_session_sweeper, AppState, SESSION_COOKIE};

/// Loads `path` if given, otherwise the defaults. Either way the result is
/// validated.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ChorusConfig> {
    match path {
        Some(path) => ChorusConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => {
            let config = ChorusConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Builds the provider client. Fails if the API credential is missing.
pub fn build_client(config: &ChorusConfig) -> anyhow::Result<OpenAiClient> {
    let api_key = config.resolve_api_key()?;
    let client = OpenAiClient::new(
        ClientConfig::new(api_key)
            .with_base_url(config.provider.base_url.clone())
            .with_model(config.provider.model.clone())
            .with_timeout(config.provider.timeout()),
    )?;
    Ok(client)
}

/// Builds the orchestrator with one client serving completions and
/// moderation.
pub fn build_chorus(config: &ChorusConfig) -> anyhow::Result<Chorus> {
    let client = Arc::new(build_client(config)?);
    Ok(Chorus::new(client.clone(), client, config))
}
