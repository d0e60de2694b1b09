//! Unit tests for chorus-core.

#[test]
fn test_crate_structure() {
    // Smoke test - verifies the module structure compiles
    use crate::{ChorusConfig, ContextWindow, Conversation, Rejection, TurnOutcome, TurnRequest};

    let config = ChorusConfig::default();
    let _window: ContextWindow = config.context_window();
    let _conversation = Conversation::new();
    let _request = TurnRequest::new("hello");
    let _rejected = TurnOutcome::rejected(Rejection::EmptyMessage);
}
