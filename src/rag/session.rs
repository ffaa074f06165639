//! Per-conversation chat state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Chat history plus the video the conversation is scoped to, if any.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub video_id: Option<String>,
    pub history: Vec<ChatMessage>,
}

impl Session {
    pub fn new(video_id: Option<String>) -> Self {
        Self {
            video_id,
            history: Vec::new(),
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    /// Forget the history but keep the scope.
    pub fn clear(&mut self) {
        self.history.clear();
    }
}
