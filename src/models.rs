use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const GREETING_TEXT: &str = "Hi! I'm MindMate. How can I help today?";
pub const CLEARED_TEXT: &str = "Conversation cleared. How can I help now?";
pub const WELCOME_TITLE: &str = "Welcome to MindMate";
pub const DEFAULT_TITLE: &str = "New conversation";

/// Represents the role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    /// Older browser data stored replies as `bot`.
    #[serde(alias = "bot")]
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Represents a single turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }
}

/// Represents a conversation thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// New conversation seeded with the assistant greeting.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: Utc::now(),
            messages: vec![Message::assistant(GREETING_TEXT)],
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
    }
}

/// Compact row used when rendering the conversation list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub last: String,
    pub when: Option<DateTime<Utc>>,
}

const SUMMARY_PREVIEW_CHARS: usize = 36;

impl From<&Conversation> for ConversationSummary {
    fn from(conv: &Conversation) -> Self {
        let last = conv.last_message();
        let title = if conv.title.is_empty() {
            "Conversation".to_string()
        } else {
            conv.title.clone()
        };

        Self {
            id: conv.id.clone(),
            title,
            last: truncate(last.map(|m| m.text.as_str()).unwrap_or(""), SUMMARY_PREVIEW_CHARS),
            when: last.map(|m| m.timestamp),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut out: String = text.chars().take(max - 1).collect();
        out.push('…');
        out
    } else {
        text.to_string()
    }
}
