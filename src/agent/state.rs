//! Per-invocation conversation state and the update-merge rules.

use crate::message::{filter_valid, Turn};
use std::collections::HashSet;

/// The mutable unit threaded through one workflow invocation.
///
/// Constructed fresh per external call from caller-supplied history plus prior
/// summary/style, mutated only inside the workflow steps, discarded once the
/// reply and updated metadata are extracted. Empty string means "not present".
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    /// Ordered turn sequence, oldest first. May contain tombstone markers;
    /// every consumer goes through [`filter_valid`].
    pub turns: Vec<Turn>,

    /// Running summary of earlier conversation content.
    pub summary: String,

    /// Running conversational-style profile of the student.
    pub style: String,
}

/// Output of one workflow step, merged into [`ConversationState`].
///
/// Tombstones logically remove their target turns; plain turns are appended.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub turns: Vec<Turn>,
    pub summary: Option<String>,
    pub style: Option<String>,
}

impl ConversationState {
    pub fn new(turns: Vec<Turn>, summary: String, style: String) -> Self {
        Self {
            turns,
            summary,
            style,
        }
    }

    /// Live (non-tombstoned) turns, in order.
    pub fn live_turns(&self) -> Vec<Turn> {
        filter_valid(&self.turns)
    }

    /// Merge a step's output. Tombstone removals are applied before appends;
    /// the tombstone markers themselves are kept at the tail so the caller
    /// receives the full picture back. Summary and style replace wholesale.
    pub fn apply(&mut self, update: StateUpdate) {
        let removed: HashSet<&str> = update
            .turns
            .iter()
            .filter(|t| t.is_tombstone())
            .map(|t| t.id.as_str())
            .collect();

        if !removed.is_empty() {
            self.turns
                .retain(|t| t.is_tombstone() || !removed.contains(t.id.as_str()));
        }

        self.turns.extend(update.turns);

        if let Some(summary) = update.summary {
            self.summary = summary;
        }
        if let Some(style) = update.style {
            self.style = style;
        }
    }

    /// Content of the most recent turn, live or not.
    pub fn last_content(&self) -> Option<&str> {
        self.turns.last().map(|t| t.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Turn;

    fn state_with(turns: Vec<Turn>) -> ConversationState {
        ConversationState::new(turns, String::new(), String::new())
    }

    #[test]
    fn test_apply_removes_targets_before_appending() {
        let a = Turn::user("a");
        let b = Turn::assistant("b");
        let mut state = state_with(vec![a.clone(), b.clone()]);

        let reply = Turn::assistant("c");
        state.apply(StateUpdate {
            turns: vec![Turn::tombstone(a.id.clone()), reply.clone()],
            summary: None,
            style: None,
        });

        let live = state.live_turns();
        assert_eq!(live, vec![b, reply]);
        // the marker stays in the raw sequence
        assert!(state.turns.iter().any(|t| t.is_tombstone() && t.id == a.id));
    }

    #[test]
    fn test_apply_replaces_summary_and_style() {
        let mut state = state_with(vec![Turn::user("hi")]);
        state.summary = "old summary".to_string();

        state.apply(StateUpdate {
            turns: vec![],
            summary: Some("new summary".to_string()),
            style: Some("prefers examples".to_string()),
        });

        assert_eq!(state.summary, "new summary");
        assert_eq!(state.style, "prefers examples");
    }

    #[test]
    fn test_apply_without_fields_keeps_existing_metadata() {
        let mut state = state_with(vec![Turn::user("hi")]);
        state.summary = "kept".to_string();

        state.apply(StateUpdate {
            turns: vec![Turn::assistant("reply")],
            summary: None,
            style: None,
        });

        assert_eq!(state.summary, "kept");
        assert_eq!(state.live_turns().len(), 2);
    }
}
