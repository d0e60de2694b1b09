//! Conversation history.
//!
//! A [`Conversation`] is an ordered, append-only list of user and assistant
//! messages. Rejected turns leave it untouched; an accepted turn appends
//! exactly one user message followed by exactly one assistant message.

use chorus_council::ChatMessage;
use serde::{Deserialize, Serialize};

/// Who authored a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Local wall-clock time in `HH:MM`.
    pub timestamp: String,
}

impl Message {
    fn to_chat(&self) -> ChatMessage {
        match self.role {
            Role::User => ChatMessage::user(self.content.clone()),
            Role::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

/// Current local time formatted as `HH:MM`.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// How much prior history is sent to the model.
///
/// Stored history is never truncated; the window only limits what a
/// completion request carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextWindow {
    max_messages: usize,
}

impl ContextWindow {
    /// A window of at most `max_messages` messages. `0` is unbounded.
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }

    /// A window that sends the whole history.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// The slice of `messages` inside the window.
    ///
    /// Keeps the most recent messages. A window never opens on an assistant
    /// message, so its first entry may be dropped to keep user/assistant
    /// pairs intact.
    pub fn apply<'a>(&self, messages: &'a [Message]) -> &'a [Message] {
        if self.max_messages == 0 || messages.len() <= self.max_messages {
            return messages;
        }
        let mut start = messages.len() - self.max_messages;
        if messages[start].role == Role::Assistant {
            start += 1;
        }
        &messages[start..]
    }
}

/// Ordered user/assistant history for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub(crate) fn push_user(&mut self, content: impl Into<String>, timestamp: impl Into<String>) {
        self.push(Role::User, content.into(), timestamp.into());
    }

    pub(crate) fn push_assistant(
        &mut self,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) {
        self.push(Role::Assistant, content.into(), timestamp.into());
    }

    fn push(&mut self, role: Role, content: String, timestamp: String) {
        self.messages.push(Message {
            role,
            content,
            timestamp,
        });
    }

    /// Prior history as model messages, limited by `window`.
    pub fn context(&self, window: &ContextWindow) -> Vec<ChatMessage> {
        window
            .apply(&self.messages)
            .iter()
            .map(Message::to_chat)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_council::ChatRole;

    fn conversation_with_turns(turns: usize) -> Conversation {
        let mut conversation = Conversation::new();
        for i in 0..turns {
            conversation.push_user(format!("question {}", i), "10:00");
            conversation.push_assistant(format!("answer {}", i), "10:00");
        }
        conversation
    }

    #[test]
    fn test_new_conversation_is_empty() {
        let conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert_eq!(conversation.len(), 0);
    }

    #[test]
    fn test_push_preserves_order_and_roles() {
        let conversation = conversation_with_turns(2);
        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(conversation.messages()[2].content, "question 1");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut conversation = conversation_with_turns(3);
        conversation.clear();
        assert!(conversation.is_empty());
        conversation.clear();
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_context_maps_roles() {
        let conversation = conversation_with_turns(1);
        let context = conversation.context(&ContextWindow::unbounded());
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].role, ChatRole::User);
        assert_eq!(context[1].role, ChatRole::Assistant);
        assert_eq!(context[1].content, "answer 0");
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let conversation = conversation_with_turns(5);
        let context = conversation.context(&ContextWindow::new(4));
        assert_eq!(context.len(), 4);
        assert_eq!(context[0].content, "question 3");
        assert_eq!(context[3].content, "answer 4");
    }

    #[test]
    fn test_window_never_opens_on_assistant() {
        let conversation = conversation_with_turns(5);
        let context = conversation.context(&ContextWindow::new(3));
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].role, ChatRole::User);
        assert_eq!(context[0].content, "question 4");
    }

    #[test]
    fn test_window_does_not_touch_storage() {
        let conversation = conversation_with_turns(5);
        let _ = conversation.context(&ContextWindow::new(2));
        assert_eq!(conversation.len(), 10);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 5);
        assert_eq!(&ts[2..3], ":");
        assert!(ts[..2].chars().all(|c| c.is_ascii_digit()));
        assert!(ts[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_message_serialization() {
        let message = Message {
            role: Role::Assistant,
            content: "hi".to_string(),
            timestamp: "09:15".to_string(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "role": "assistant", "content": "hi", "timestamp": "09:15" })
        );
    }
}
