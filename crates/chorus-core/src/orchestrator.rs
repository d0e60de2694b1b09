//! The conversation orchestrator.
//!
//! [`Chorus`] runs one user turn end to end: validation, input moderation,
//! generation, output moderation, and the two history appends.

use std::sync::Arc;

use chorus_council::{error_response, CompletionBackend, Council};
use chorus_firewall::{ModerationBackend, ModerationGate};
use tracing::{debug, info, warn};

use crate::config::{is_valid_temperature, ChorusConfig};
use crate::conversation::{timestamp_now, ContextWindow, Conversation};
use crate::session::SessionStore;
use crate::turn::{Rejection, TurnOutcome, TurnRequest};

/// Produces the `HH:MM` timestamp for a turn.
pub type Clock = fn() -> String;

/// The conversation orchestrator.
///
/// Chorus owns no conversation state. Callers hand it the session's
/// [`Conversation`] for the duration of a turn, or use
/// [`send_to_session`](Self::send_to_session) to have the session locked
/// for them.
///
/// # Turn Pipeline
///
/// 1. Reject an empty (whitespace-only) message
/// 2. Reject an out-of-range temperature when it will be used
/// 3. Moderate the trimmed message; reject if flagged
/// 4. Append the user message
/// 5. Generate: consensus over the sampler, or a single completion
/// 6. Moderate the output; replace it with the refusal if flagged
/// 7. Append the assistant message with the timestamp from step 4
///
/// Rejections in steps 1-3 leave history untouched. Remote completion
/// failures never reject: they become `"Error: ..."` assistant text.
///
/// # Example
///
/// ```rust,ignore
/// let chorus = Chorus::new(completions, moderation, &ChorusConfig::default());
/// let mut conversation = Conversation::new();
///
/// match chorus.send_message(&mut conversation, &TurnRequest::new("Hello")).await {
///     TurnOutcome::Reply(reply) => println!("[{}] {}", reply.timestamp, reply.response),
///     TurnOutcome::Rejected(why) => eprintln!("{}", why),
/// }
/// ```
pub struct Chorus {
    council: Council,
    gate: ModerationGate,
    window: ContextWindow,
    refusal: String,
    clock: Clock,
}

impl Chorus {
    /// Builds an orchestrator from remote backends and configuration.
    pub fn new(
        completions: Arc<dyn CompletionBackend>,
        moderation: Arc<dyn ModerationBackend>,
        config: &ChorusConfig,
    ) -> Self {
        Self::with_components(
            Council::with_config(completions, config.sampler_config()),
            ModerationGate::with_config(moderation, config.gate_config()),
            config.context_window(),
            config.moderation.refusal_message.clone(),
        )
    }

    /// Builds an orchestrator from prepared components.
    pub fn with_components(
        council: Council,
        gate: ModerationGate,
        window: ContextWindow,
        refusal: impl Into<String>,
    ) -> Self {
        Self {
            council,
            gate,
            window,
            refusal: refusal.into(),
            clock: timestamp_now,
        }
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn council(&self) -> &Council {
        &self.council
    }

    pub fn gate(&self) -> &ModerationGate {
        &self.gate
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    /// Text stored in place of a flagged completion.
    pub fn refusal(&self) -> &str {
        &self.refusal
    }

    /// Runs one turn against `conversation`.
    ///
    /// On [`TurnOutcome::Reply`] exactly two messages were appended. On
    /// [`TurnOutcome::Rejected`] nothing was.
    pub async fn send_message(
        &self,
        conversation: &mut Conversation,
        request: &TurnRequest,
    ) -> TurnOutcome {
        match self.admit(request).await {
            Ok(message) => self.complete_turn(conversation, message, request).await,
            Err(rejection) => TurnOutcome::rejected(rejection),
        }
    }

    /// Runs one turn against a stored session, holding its lock throughout.
    ///
    /// An unknown session is created only once the turn has passed
    /// validation and input moderation, so rejected turns never add one.
    pub async fn send_to_session(
        &self,
        sessions: &SessionStore,
        session_id: &str,
        request: &TurnRequest,
    ) -> TurnOutcome {
        if let Some(handle) = sessions.get(session_id).await {
            let mut conversation = handle.lock().await;
            return self.send_message(&mut conversation, request).await;
        }

        let message = match self.admit(request).await {
            Ok(message) => message,
            Err(rejection) => return TurnOutcome::rejected(rejection),
        };
        let handle = sessions.get_or_create(session_id).await;
        let mut conversation = handle.lock().await;
        self.complete_turn(&mut conversation, message, request).await
    }

    /// Empties `conversation`. Always succeeds.
    pub fn clear(&self, conversation: &mut Conversation) {
        conversation.clear();
        debug!("Conversation cleared");
    }

    /// Steps 1-3: the trimmed message, or why the turn is rejected.
    async fn admit<'r>(&self, request: &'r TurnRequest) -> Result<&'r str, Rejection> {
        let message = request.message.trim();
        if message.is_empty() {
            debug!("Rejected empty message");
            return Err(Rejection::EmptyMessage);
        }

        if !request.compare_responses && !is_valid_temperature(request.temperature) {
            debug!(temperature = request.temperature, "Rejected temperature");
            return Err(Rejection::InvalidTemperature {
                value: request.temperature.to_string(),
            });
        }

        let verdict = self.gate.check(message).await;
        if verdict.is_flagged() {
            info!(
                categories = ?verdict.flagged_categories(),
                "Input flagged by moderation"
            );
            return Err(Rejection::Flagged {
                categories: verdict.categories,
            });
        }

        Ok(message)
    }

    /// Steps 4-7 for an admitted message.
    async fn complete_turn(
        &self,
        conversation: &mut Conversation,
        message: &str,
        request: &TurnRequest,
    ) -> TurnOutcome {
        let history = conversation.context(&self.window);
        let timestamp = (self.clock)();
        conversation.push_user(message, timestamp.clone());

        let candidate = self.generate(message, &history, request).await;

        let response = if self.gate.check(&candidate).await.is_flagged() {
            warn!("Output flagged by moderation, substituting refusal");
            self.refusal.clone()
        } else {
            candidate
        };

        conversation.push_assistant(response.clone(), timestamp.clone());
        info!(
            history = conversation.len(),
            compared = request.compare_responses,
            reasoning = request.use_reasoning_mode,
            "Turn complete"
        );

        TurnOutcome::reply(response, timestamp)
    }

    async fn generate(
        &self,
        prompt: &str,
        history: &[chorus_council::ChatMessage],
        request: &TurnRequest,
    ) -> String {
        if request.compare_responses {
            match self
                .council
                .deliberate(prompt, history, request.use_reasoning_mode)
                .await
            {
                Ok(deliberation) => deliberation.response,
                Err(e) => {
                    warn!("Consensus failed: {}", e);
                    error_response(e)
                }
            }
        } else {
            self.council
                .respond_once(
                    prompt,
                    history,
                    request.temperature,
                    request.use_reasoning_mode,
                )
                .await
                .text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chorus_council::{CompletionRequest, CouncilError};
    use chorus_firewall::{ModerationError, ModerationVerdict};

    struct Echo;

    #[async_trait]
    impl CompletionBackend for Echo {
        async fn complete(&self, request: &CompletionRequest) -> chorus_council::Result<String> {
            match request.messages.last() {
                Some(last) => Ok(format!("echo: {}", last.content)),
                None => Err(CouncilError::Completion("no messages".into())),
            }
        }
    }

    struct AllowAll;

    #[async_trait]
    impl ModerationBackend for AllowAll {
        async fn moderate(&self, _text: &str) -> Result<ModerationVerdict, ModerationError> {
            Ok(ModerationVerdict::clean())
        }
    }

    fn fixed_clock() -> String {
        "08:45".to_string()
    }

    fn chorus() -> Chorus {
        let mut config = ChorusConfig::default();
        config.sampler.pacing_ms = 0;
        Chorus::new(Arc::new(Echo), Arc::new(AllowAll), &config).with_clock(fixed_clock)
    }

    #[tokio::test]
    async fn test_single_turn_appends_pair() {
        let chorus = chorus();
        let mut conversation = Conversation::new();
        let outcome = chorus
            .send_message(&mut conversation, &TurnRequest::new("  hi  "))
            .await;

        assert_eq!(outcome, TurnOutcome::reply("echo: hi", "08:45"));
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].content, "hi");
    }

    #[tokio::test]
    async fn test_temperature_ignored_when_comparing() {
        let chorus = chorus();
        let mut conversation = Conversation::new();
        let request = TurnRequest::new("hi").with_temperature(9.0);
        assert!(chorus.send_message(&mut conversation, &request).await.is_reply());
    }

    #[tokio::test]
    async fn test_clear() {
        let chorus = chorus();
        let mut conversation = Conversation::new();
        chorus
            .send_message(&mut conversation, &TurnRequest::new("hi"))
            .await;
        chorus.clear(&mut conversation);
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_send_to_session_uses_store() {
        let chorus = chorus();
        let sessions = SessionStore::new();
        chorus
            .send_to_session(&sessions, "s1", &TurnRequest::new("hi"))
            .await;

        let handle = sessions.get("s1").await.unwrap();
        assert_eq!(handle.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_turn_creates_no_session() {
        let chorus = chorus();
        let sessions = SessionStore::new();

        for request in [
            TurnRequest::new("   "),
            TurnRequest::new("hi")
                .with_compare_responses(false)
                .with_temperature(-1.0),
        ] {
            let outcome = chorus.send_to_session(&sessions, "s1", &request).await;
            assert!(outcome.is_rejected());
        }
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejected_turn_keeps_existing_session() {
        let chorus = chorus();
        let sessions = SessionStore::new();
        chorus
            .send_to_session(&sessions, "s1", &TurnRequest::new("hi"))
            .await;

        let outcome = chorus
            .send_to_session(&sessions, "s1", &TurnRequest::new(""))
            .await;
        assert!(outcome.is_rejected());
        assert_eq!(sessions.get("s1").await.unwrap().lock().await.len(), 2);
    }
}
