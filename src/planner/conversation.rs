//! Conversation history: an append-only list of role-tagged turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn transcript_label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    /// Zero-based index in the conversation.
    pub position: usize,
    pub timestamp: DateTime<Utc>,
}

/// Ordered turn history. Turns are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Role::User, text.into());
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(Role::Assistant, text.into());
    }

    fn push(&mut self, role: Role, text: String) {
        let position = self.turns.len();
        self.turns.push(ConversationTurn {
            role,
            text,
            position,
            timestamp: Utc::now(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The last `k` turns, oldest first.
    pub fn recent(&self, k: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(k);
        &self.turns[start..]
    }

    /// `User: …` / `Assistant: …` blocks separated by blank lines.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role.transcript_label(), t.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
