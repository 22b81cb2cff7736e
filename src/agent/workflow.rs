//! Tutor workflow: routing decision, answer step, and the two-node driver.

use super::state::{ConversationState, StateUpdate};
use super::summarize;
use crate::llm::{ChatMessage, TextGenerator};
use crate::message::{Role, Turn};
use crate::prompts;
use crate::{Result, TutorError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Turn-count threshold above which the conversation is summarized first.
/// Counts whole user/assistant pairs plus the newest unanswered message.
pub const DEFAULT_SUMMARIZE_THRESHOLD: usize = 11;

/// Next step chosen by inspecting the conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    Summarize,
    AnswerDirectly,
}

/// Choose the next workflow node from the live turn count.
///
/// A trailing system turn is scaffolding, not conversational content, and does
/// not count toward the threshold. An empty live history is a caller bug.
pub fn decide(state: &ConversationState, threshold: usize) -> Result<RoutingDecision> {
    let live = state.live_turns();
    let mut count = live.len();
    if count == 0 {
        return Err(TutorError::Internal(
            "no valid messages found in the conversation history; history might be empty"
                .to_string(),
        ));
    }
    if live[count - 1].role == Role::System {
        count -= 1;
    }

    if count > threshold {
        Ok(RoutingDecision::Summarize)
    } else {
        Ok(RoutingDecision::AnswerDirectly)
    }
}

/// One external invocation of the tutor workflow.
///
/// `history` must already contain the newest student message as its last live
/// turn; `message` is echoed for the caller's bookkeeping and logging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvokeRequest {
    pub message: String,
    pub history: Vec<Turn>,
    pub session_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub style: String,
    /// Rendered question-materials block, empty when absent.
    #[serde(default)]
    pub question_context: String,
}

/// Result of one invocation: the reply plus the metadata the caller must
/// persist for the next call, and the input history echoed back unmodified.
#[derive(Debug, Clone, Serialize)]
pub struct InvokeOutcome {
    pub reply: String,
    pub summary: String,
    pub style: String,
    pub history: Vec<Turn>,
}

/// The tutoring agent: a fixed two-node workflow with conditional entry.
///
/// Topology: routing selects `Summarize` or `Answer`; `Summarize` always
/// transitions to `Answer`; `Answer` is terminal. The agent holds no state
/// between invocations.
pub struct TutorAgent {
    generator: Arc<dyn TextGenerator>,
    persona: String,
    threshold: usize,
}

enum WorkflowNode {
    Summarize,
    Answer,
}

impl TutorAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            persona: prompts::ROLE_PROMPT.to_string(),
            threshold: DEFAULT_SUMMARIZE_THRESHOLD,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Run one workflow pass and surface the final state.
    pub async fn invoke(&self, request: InvokeRequest) -> Result<InvokeOutcome> {
        info!(
            session_id = %request.session_id,
            turns = request.history.len(),
            "invoking tutor agent"
        );

        let mut state = ConversationState::new(
            request.history.clone(),
            request.summary.clone(),
            request.style.clone(),
        );

        let mut node = match decide(&state, self.threshold)? {
            RoutingDecision::Summarize => WorkflowNode::Summarize,
            RoutingDecision::AnswerDirectly => WorkflowNode::Answer,
        };

        loop {
            match node {
                WorkflowNode::Summarize => {
                    let update = summarize::run(
                        self.generator.as_ref(),
                        &state,
                        &request.summary,
                        &request.style,
                    )
                    .await?;
                    state.apply(update);
                    node = WorkflowNode::Answer;
                }
                WorkflowNode::Answer => {
                    self.answer(&mut state, &request.question_context).await?;
                    break;
                }
            }
        }

        let reply = state.last_content().unwrap_or_default().to_string();
        Ok(InvokeOutcome {
            reply,
            summary: state.summary,
            style: state.style,
            history: request.history,
        })
    }

    /// Answer step: assemble the system prompt, invoke the model once, append
    /// the reply as a new turn.
    async fn answer(&self, state: &mut ConversationState, question_context: &str) -> Result<()> {
        let system =
            assemble_system_message(&self.persona, question_context, &state.summary, &state.style);

        let mut messages = vec![ChatMessage::new("system", system)];
        messages.extend(
            state
                .live_turns()
                .iter()
                .map(|t| ChatMessage::new(t.role.as_str(), t.content.clone())),
        );

        debug!("Answer step with {} messages", messages.len());
        let response = self.generator.generate(&messages).await?;

        state.apply(StateUpdate {
            turns: vec![Turn::assistant(response.content)],
            summary: None,
            style: None,
        });
        Ok(())
    }
}

/// System message: persona + optional question materials + summary block (iff
/// a summary exists) + style block (iff a style profile exists).
pub(crate) fn assemble_system_message(
    persona: &str,
    question_context: &str,
    summary: &str,
    style: &str,
) -> String {
    let mut system = persona.to_string();

    if !question_context.is_empty() {
        system.push_str(&format!(
            "## Known Question Materials: {question_context} \n\n"
        ));
    }
    if !summary.is_empty() {
        system.push_str(&prompts::summary_system_prompt(summary));
    }
    if !style.is_empty() {
        system.push_str(&prompts::style_system_prompt(style));
    }

    system
}
