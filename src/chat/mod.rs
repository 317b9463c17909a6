//! Conversation log and reply selection for the coaching chat.
//!
//! Replies come from a [`ResponseProvider`] seam so the shell can swap the
//! canned coach for a real model without touching the log.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use uuid::Uuid;

/// Delay between a user message landing and the reply appearing, so the
/// typing indicator is visible.
pub const TYPING_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ki,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Produces the coach's reply to a user message.
pub trait ResponseProvider: Send + Sync {
    fn respond_to(&self, message: &str) -> String;
}

/// A rotating set of reflective coaching replies.
pub struct CannedResponses;

const REPLIES: &[&str] = &[
    "I hear you. That sounds like something many couples experience. Let's explore this together.",
    "Thank you for sharing that with me. I can sense this is important to you.",
    "I understand how that might feel. Every relationship has its unique dynamics.",
    "That's a meaningful observation. What emotions come up for you when you think about this?",
    "I appreciate your openness. Let's work through this step by step.",
];

impl ResponseProvider for CannedResponses {
    fn respond_to(&self, _message: &str) -> String {
        REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(REPLIES[0])
            .to_string()
    }
}

/// Ordered message history plus the typing-indicator flag. A user message
/// raises the flag; the flag drops when the reply is appended.
#[derive(Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    typing: bool,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the log with the personalized greeting.
    pub fn with_greeting(user_name: &str) -> Self {
        let greeting = format!(
            "Welcome back, {user_name}! I'm here to help strengthen your \
             relationship. What's on your mind today? 💕"
        );
        Self {
            messages: vec![ChatMessage::new(Sender::Ki, greeting)],
            typing: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Append a user message and raise the typing indicator.
    pub fn push_user(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.messages.push(ChatMessage::new(Sender::User, content));
        self.typing = true;
        self.messages.last().unwrap()
    }

    /// Append the coach's reply to the latest user message and drop the
    /// typing indicator.
    pub fn complete_reply(&mut self, provider: &dyn ResponseProvider) -> &ChatMessage {
        let prompt = self
            .messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let reply = provider.respond_to(&prompt);
        self.messages.push(ChatMessage::new(Sender::Ki, reply));
        self.typing = false;
        self.messages.last().unwrap()
    }
}
