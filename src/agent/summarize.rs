//! Summarization step: compacts history into an updated summary and
//! conversational-style profile, tombstoning the superseded turns.

use super::state::{ConversationState, StateUpdate};
use crate::llm::{ChatMessage, TextGenerator};
use crate::message::Turn;
use crate::prompts;
use crate::Result;
use tracing::debug;

/// The most recent exchange survives compaction verbatim.
const KEEP_RECENT_TURNS: usize = 3;

/// Run the summarization step.
///
/// `prior_summary` / `prior_style` are the caller's persisted values; when
/// non-empty they are authoritative over whatever the in-call state carries.
/// Two independent generation calls are made (summary, style) over the same
/// turn prefix; neither depends on the other's output, so they run
/// concurrently. Either failure fails the step with nothing committed.
pub(crate) async fn run(
    generator: &dyn TextGenerator,
    state: &ConversationState,
    prior_summary: &str,
    prior_style: &str,
) -> Result<StateUpdate> {
    let live = state.live_turns();

    let summary_basis = if prior_summary.is_empty() {
        state.summary.as_str()
    } else {
        prior_summary
    };
    let style_basis = if prior_style.is_empty() {
        state.style.as_str()
    } else {
        prior_style
    };

    // All turns except the most recent one, plus the synthetic instruction.
    let prefix = &live[..live.len().saturating_sub(1)];
    let summary_request = build_request(prefix, &summary_instruction(summary_basis));
    let style_request = build_request(prefix, &style_instruction(style_basis));

    debug!(
        "Summarizing {} turns (prior summary: {}, prior style: {})",
        live.len(),
        !summary_basis.is_empty(),
        !style_basis.is_empty()
    );

    let (summary_response, style_response) = tokio::try_join!(
        generator.generate(&summary_request),
        generator.generate(&style_request),
    )?;

    Ok(StateUpdate {
        turns: tombstones_for(&live),
        summary: Some(summary_response.content),
        style: Some(style_response.content),
    })
}

/// Update-vs-create summary instruction, depending on whether a summary exists.
fn summary_instruction(summary: &str) -> String {
    if summary.is_empty() {
        prompts::SUMMARY_PROMPT.to_string()
    } else {
        format!(
            "This is summary of the conversation to date: {summary}\n\n{}",
            prompts::update_summary_prompt()
        )
    }
}

/// Update-vs-create style instruction, depending on whether a profile exists.
fn style_instruction(style: &str) -> String {
    if style.is_empty() {
        prompts::conv_pref_prompt()
    } else {
        format!(
            "This is the previous conversational style of the student for this conversation: {style}\n\n{}",
            prompts::update_conv_pref_prompt()
        )
    }
}

fn build_request(prefix: &[Turn], instruction: &str) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = prefix
        .iter()
        .map(|t| ChatMessage::new(t.role.as_str(), t.content.clone()))
        .collect();
    messages.push(ChatMessage::new("system", instruction));
    messages
}

/// Tombstones for every live turn except the last [`KEEP_RECENT_TURNS`].
fn tombstones_for(live: &[Turn]) -> Vec<Turn> {
    let cutoff = live.len().saturating_sub(KEEP_RECENT_TURNS);
    live[..cutoff]
        .iter()
        .map(|t| Turn::tombstone(t.id.clone()))
        .collect()
}
