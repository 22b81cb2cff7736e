//! Message model: conversation turns and the tombstone deletion marker.
//!
//! A tombstone is a marker turn saying another turn (matched by identity) should
//! be treated as removed. Tombstones are stripped by [`filter_valid`] before any
//! turn sequence reaches the model or a length computation.

use serde::{Deserialize, Serialize};

/// Role of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tombstone,
}

impl Role {
    /// Wire name used by the Chat Completions API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tombstone => "tombstone",
        }
    }
}

/// One message in a conversation.
///
/// `id` is assigned at creation and used only to target tombstones. Callers may
/// supply their own ids when echoing history back in; turns deserialized without
/// one get a fresh UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default = "new_turn_id")]
    pub id: String,

    /// Wire name `type` matches the caller-supplied history format.
    #[serde(rename = "type")]
    pub role: Role,

    #[serde(default)]
    pub content: String,
}

fn new_turn_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_turn_id(),
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Tombstone superseding the turn with `target_id`. Carries no content.
    pub fn tombstone(target_id: impl Into<String>) -> Self {
        Self {
            id: target_id.into(),
            role: Role::Tombstone,
            content: String::new(),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.role == Role::Tombstone
    }
}

/// Ordered subsequence of `turns` excluding every tombstone.
///
/// Pure and total; applying it twice yields the same result as applying it once.
pub fn filter_valid(turns: &[Turn]) -> Vec<Turn> {
    turns.iter().filter(|t| !t.is_tombstone()).cloned().collect()
}
