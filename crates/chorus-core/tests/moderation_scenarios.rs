//! # Moderation Scenario Tests
//!
//! Input and output gating through full turns, including outages in both
//! fail modes.

mod common;

use common::{chorus_with, fast_config, KeywordModeration, ScriptedCompletions};

use chorus_core::{
    Chorus, Conversation, FailMode, ModerationGate, Rejection, TurnRequest, DEFAULT_REFUSAL,
};
use chorus_council::Council;
use chorus_firewall::{GateConfig, UNAVAILABLE_CATEGORY};

fn single(message: &str) -> TurnRequest {
    TurnRequest::new(message).with_compare_responses(false)
}

// =============================================================================
// INPUT GATING
// =============================================================================

#[tokio::test]
async fn test_flagged_input_rejected_with_categories() {
    let completions = ScriptedCompletions::new();
    let moderation = KeywordModeration::flagging(vec![("attack", "violence"), ("slur", "hate")]);
    let chorus = chorus_with(completions.clone(), moderation, &fast_config());
    let mut conversation = Conversation::new();

    let outcome = chorus
        .send_message(&mut conversation, &single("plan an attack"))
        .await;

    let rejection = outcome.as_rejection().expect("input should be rejected");
    assert_eq!(rejection.to_string(), "Message flagged by content moderation");
    let categories = rejection.categories().unwrap();
    assert_eq!(categories.get("violence"), Some(&true));
    assert_eq!(categories.get("hate"), Some(&false));

    assert!(conversation.is_empty());
    assert_eq!(completions.call_count(), 0, "Flagged input must not reach the model");
}

#[tokio::test]
async fn test_input_moderated_after_trimming() {
    let moderation = KeywordModeration::allow_all();
    let chorus = chorus_with(
        ScriptedCompletions::new(),
        moderation.clone(),
        &fast_config(),
    );
    let mut conversation = Conversation::new();

    chorus
        .send_message(&mut conversation, &single("   hello there \n"))
        .await;

    assert_eq!(moderation.seen()[0], "hello there");
}

#[tokio::test]
async fn test_rejection_preserves_existing_history() {
    let moderation = KeywordModeration::flagging(vec![("attack", "violence")]);
    let chorus = chorus_with(ScriptedCompletions::new(), moderation, &fast_config());
    let mut conversation = Conversation::new();

    chorus.send_message(&mut conversation, &single("hello")).await;
    let before = conversation.clone();

    chorus
        .send_message(&mut conversation, &single("attack now"))
        .await;
    assert_eq!(conversation, before);
}

// =============================================================================
// OUTPUT GATING
// =============================================================================

#[tokio::test]
async fn test_flagged_output_replaced_with_refusal() {
    let completions = ScriptedCompletions::with_replies(["here is something violent"]);
    let moderation = KeywordModeration::flagging(vec![("violent", "violence")]);
    let chorus = chorus_with(completions, moderation.clone(), &fast_config());
    let mut conversation = Conversation::new();

    let outcome = chorus
        .send_message(&mut conversation, &single("tell me a story"))
        .await;

    assert_eq!(outcome.as_reply().unwrap().response, DEFAULT_REFUSAL);
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation.messages()[0].content, "tell me a story");
    assert_eq!(conversation.messages()[1].content, DEFAULT_REFUSAL);
    assert_eq!(
        moderation.seen(),
        vec!["tell me a story", "here is something violent"]
    );
}

#[tokio::test]
async fn test_output_gate_sees_consensus_winner_only() {
    let completions = ScriptedCompletions::with_replies(["calm reply", "calm reply", "violent"]);
    let moderation = KeywordModeration::flagging(vec![("violent", "violence")]);
    let chorus = chorus_with(completions, moderation.clone(), &fast_config());
    let mut conversation = Conversation::new();

    let outcome = chorus
        .send_message(&mut conversation, &TurnRequest::new("hi"))
        .await;

    assert_eq!(outcome.as_reply().unwrap().response, "calm reply");
    assert_eq!(moderation.seen(), vec!["hi", "calm reply"]);
}

#[tokio::test]
async fn test_custom_refusal_message() {
    let completions = ScriptedCompletions::with_replies(["violent"]);
    let moderation = KeywordModeration::flagging(vec![("violent", "violence")]);
    let mut config = fast_config();
    config.moderation.refusal_message = "Withheld.".to_string();
    let chorus = chorus_with(completions, moderation, &config);
    let mut conversation = Conversation::new();

    let outcome = chorus.send_message(&mut conversation, &single("hi")).await;
    assert_eq!(outcome.as_reply().unwrap().response, "Withheld.");
    assert_eq!(chorus.refusal(), "Withheld.");
}

// =============================================================================
// OUTAGE HANDLING
// =============================================================================

#[tokio::test]
async fn test_outage_fails_open_and_is_counted() {
    let completions = ScriptedCompletions::with_replies(["answer"]);
    let chorus = chorus_with(completions, KeywordModeration::unavailable(), &fast_config());
    let mut conversation = Conversation::new();

    let outcome = chorus.send_message(&mut conversation, &single("hi")).await;

    assert_eq!(outcome.as_reply().unwrap().response, "answer");
    assert_eq!(conversation.len(), 2);
    assert_eq!(chorus.gate().fail_open_count(), 2, "Input and output checks both failed open");
}

#[tokio::test]
async fn test_outage_fails_closed_when_configured() {
    let completions = ScriptedCompletions::new();
    let mut config = fast_config();
    config.moderation.fail_mode = FailMode::Closed;
    let chorus = chorus_with(completions.clone(), KeywordModeration::unavailable(), &config);
    let mut conversation = Conversation::new();

    let outcome = chorus.send_message(&mut conversation, &single("hi")).await;

    match outcome.as_rejection() {
        Some(Rejection::Flagged { categories }) => {
            assert_eq!(categories.get(UNAVAILABLE_CATEGORY), Some(&true));
        }
        other => panic!("Expected flagged rejection, got {:?}", other),
    }
    assert!(conversation.is_empty());
    assert_eq!(completions.call_count(), 0);
    assert_eq!(chorus.gate().fail_open_count(), 0);
}

#[tokio::test]
async fn test_disabled_moderation_skips_backend() {
    let moderation = KeywordModeration::flagging(vec![("attack", "violence")]);
    let mut config = fast_config();
    config.moderation.enabled = false;
    let chorus = chorus_with(ScriptedCompletions::new(), moderation.clone(), &config);
    let mut conversation = Conversation::new();

    let outcome = chorus.send_message(&mut conversation, &single("attack")).await;

    assert!(outcome.is_reply());
    assert!(moderation.seen().is_empty());
}

#[tokio::test]
async fn test_assembled_from_components() {
    let completions = ScriptedCompletions::with_replies(["violent"]);
    let gate = ModerationGate::with_config(
        KeywordModeration::flagging(vec![("violent", "violence")]),
        GateConfig::default(),
    );
    let chorus = Chorus::with_components(
        Council::new(completions),
        gate,
        chorus_core::ContextWindow::unbounded(),
        "Nope.",
    );
    let mut conversation = Conversation::new();

    let outcome = chorus.send_message(&mut conversation, &single("hi")).await;
    assert_eq!(outcome.as_reply().unwrap().response, "Nope.");
    assert!(chorus.gate().config().enabled);
}
