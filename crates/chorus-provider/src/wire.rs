//! Wire format of the OpenAI-compatible endpoints.

use std::collections::BTreeMap;

use chorus_council::ChatMessage;
use chorus_firewall::ModerationVerdict;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;

/// `POST {base}/chat/completions` body.
#[derive(Debug, Serialize)]
pub struct ChatCompletionBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f64,
}

/// `POST {base}/moderations` body.
#[derive(Debug, Serialize)]
pub struct ModerationBody<'a> {
    pub input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    #[serde(default)]
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, Value>,
}

/// Text of the first choice.
pub fn parse_completion(body: &str) -> Result<String, ProviderError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(ProviderError::MissingContent("choices[0].message.content"))
}

/// Verdict from the first moderation result.
///
/// Categories whose value is not a boolean are dropped.
pub fn parse_moderation(body: &str) -> Result<ModerationVerdict, ProviderError> {
    let response: ModerationResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let result = response
        .results
        .into_iter()
        .next()
        .ok_or(ProviderError::MissingContent("results[0]"))?;

    Ok(ModerationVerdict {
        flagged: result.flagged,
        categories: result
            .categories
            .into_iter()
            .filter_map(|(name, value)| value.as_bool().map(|hit| (name, hit)))
            .collect(),
    })
}
