//! Simulated-student agent, used to exercise tutors with synthetic
//! conversations. Structurally the tutor workflow with the summarize branch
//! permanently disabled: one persona-driven answer step, caller-supplied
//! summary used as an unconditional override, no style derivation.

use super::state::{ConversationState, StateUpdate};
use super::workflow::{InvokeOutcome, InvokeRequest};
use crate::llm::{ChatMessage, TextGenerator};
use crate::message::Turn;
use crate::prompts;
use crate::{Result, TutorError};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Learning profile and comprehension level of the simulated student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentProfile {
    Base,
    Curious,
    Contradicting,
    Reliant,
    Confused,
    Unrelated,
}

impl StudentProfile {
    fn persona(&self) -> &'static str {
        match self {
            StudentProfile::Base => prompts::BASE_STUDENT_PERSONA,
            StudentProfile::Curious => prompts::CURIOUS_STUDENT_PERSONA,
            StudentProfile::Contradicting => prompts::CONTRADICTING_STUDENT_PERSONA,
            StudentProfile::Reliant => prompts::RELIANT_STUDENT_PERSONA,
            StudentProfile::Confused => prompts::CONFUSED_STUDENT_PERSONA,
            StudentProfile::Unrelated => prompts::UNRELATED_STUDENT_PERSONA,
        }
    }
}

impl FromStr for StudentProfile {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "base" => Ok(StudentProfile::Base),
            "curious" => Ok(StudentProfile::Curious),
            "contradicting" => Ok(StudentProfile::Contradicting),
            "reliant" => Ok(StudentProfile::Reliant),
            "confused" => Ok(StudentProfile::Confused),
            "unrelated" => Ok(StudentProfile::Unrelated),
            other => Err(TutorError::Config(format!(
                "unknown student profile type: '{other}'"
            ))),
        }
    }
}

/// The simulated-student agent. Rebuilt fresh per call; construction validates
/// the profile before any generation call is made.
pub struct StudentAgent {
    generator: Arc<dyn TextGenerator>,
    persona: String,
}

impl std::fmt::Debug for StudentAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentAgent")
            .field("persona", &self.persona)
            .finish_non_exhaustive()
    }
}

impl StudentAgent {
    pub fn new(generator: Arc<dyn TextGenerator>, profile: StudentProfile) -> Self {
        Self {
            generator,
            persona: format!("{}{}", prompts::PROCESS_PROMPT, profile.persona()),
        }
    }

    /// Construct from a profile selector string. Unknown selectors fail fast.
    pub fn from_selector(generator: Arc<dyn TextGenerator>, selector: &str) -> Result<Self> {
        Ok(Self::new(generator, selector.parse()?))
    }

    /// Run one answer-only pass. The incoming tutor message is appended as an
    /// assistant turn: from the simulated student's perspective, the tutor is
    /// the other party.
    pub async fn invoke(&self, request: InvokeRequest) -> Result<InvokeOutcome> {
        info!(
            session_id = %request.session_id,
            turns = request.history.len(),
            "invoking student agent"
        );

        let mut turns = request.history.clone();
        turns.push(Turn::assistant(request.message.clone()));
        let mut state = ConversationState::new(turns, request.summary.clone(), String::new());

        let system = student_system_message(
            &self.persona,
            &request.question_context,
            &request.summary,
        );

        let mut messages = vec![ChatMessage::new("system", system)];
        messages.extend(
            state
                .live_turns()
                .iter()
                .map(|t| ChatMessage::new(t.role.as_str(), t.content.clone())),
        );

        let response = self.generator.generate(&messages).await?;
        state.apply(StateUpdate {
            turns: vec![Turn::assistant(response.content)],
            summary: None,
            style: None,
        });

        let reply = state.last_content().unwrap_or_default().to_string();
        Ok(InvokeOutcome {
            reply,
            summary: state.summary,
            style: String::new(),
            history: request.history,
        })
    }
}

/// Student system message: persona + pronoun-swapped learning materials +
/// summary block. No style block in this variant.
fn student_system_message(persona: &str, question_context: &str, summary: &str) -> String {
    let mut system = persona.to_string();

    if !question_context.is_empty() {
        // The materials describe the student's own work; flip the perspective
        // so the agent stays in the student role.
        let materials = question_context
            .replace("My", "Your")
            .replace("my", "your")
            .replace("I am", "you are");
        system.push_str(&format!("\n\n## Known Learning Materials: {materials} \n\n"));
    }

    if !summary.is_empty() {
        system.push_str(&format!("## Summary of conversation earlier: {summary} \n\n"));
    }

    system
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parsing() {
        assert_eq!(
            "curious".parse::<StudentProfile>().unwrap(),
            StudentProfile::Curious
        );
        assert_eq!(
            "base".parse::<StudentProfile>().unwrap(),
            StudentProfile::Base
        );
    }

    #[test]
    fn test_unknown_profile_is_config_error() {
        let err = "genius".parse::<StudentProfile>().unwrap_err();
        assert!(matches!(err, TutorError::Config(_)));
        assert!(err.to_string().contains("genius"));
    }

    #[test]
    fn test_pronoun_swap_in_materials() {
        let system = student_system_message(
            "persona",
            "My latest answer was wrong and I am stuck on my proof",
            "",
        );
        assert!(system.contains("Your latest answer was wrong and you are stuck on your proof"));
        assert!(!system.contains("My latest"));
    }

    #[test]
    fn test_summary_block_only_when_present() {
        let without = student_system_message("persona", "", "");
        assert!(!without.contains("Summary of conversation earlier"));

        let with = student_system_message("persona", "", "we discussed limits");
        assert!(with.contains("## Summary of conversation earlier: we discussed limits"));
    }
}
