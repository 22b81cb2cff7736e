//! End-to-end tests for the tutoring workflow, driven by a scripted
//! text-generation fake.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use tutorloop::{
    decide, ChatMessage, InvokeRequest, LlmConfig, RoutingDecision, StudentAgent, StudentProfile,
    TextGenerator, TutorAgent, TutorError, Turn, DEFAULT_SUMMARIZE_THRESHOLD,
};

/// Fake generator that picks its reply from the trailing instruction, so the
/// two concurrent summarization calls can land in any order. Records every
/// request it receives.
struct ScriptedGenerator {
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> tutorloop::Result<ChatMessage> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let last = messages.last().expect("request is never empty");
        let content = if last.role == "system" && last.content.contains("Summarize the conversation")
        {
            "SUMMARY TEXT"
        } else if last.role == "system" && last.content.contains("Update the summary") {
            "UPDATED SUMMARY TEXT"
        } else if last.role == "system" && last.content.contains("conversational style") {
            "STYLE TEXT"
        } else {
            "TUTOR REPLY"
        };
        Ok(ChatMessage::new("assistant", content))
    }
}

/// Fake generator that always fails with a capability error.
struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _messages: &[ChatMessage]) -> tutorloop::Result<ChatMessage> {
        Err(TutorError::Generation("service unavailable".to_string()))
    }
}

fn alternating_history(n: usize) -> Vec<Turn> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                Turn::user(format!("question {i}"))
            } else {
                Turn::assistant(format!("answer {i}"))
            }
        })
        .collect()
}

fn request(history: Vec<Turn>) -> InvokeRequest {
    InvokeRequest {
        message: history.last().map(|t| t.content.clone()).unwrap_or_default(),
        history,
        session_id: "1234Test".to_string(),
        summary: String::new(),
        style: String::new(),
        question_context: String::new(),
    }
}

/// Scenario A: a single-turn conversation is answered directly.
#[tokio::test]
async fn single_turn_is_answered_directly() {
    let generator = ScriptedGenerator::new();
    let agent = TutorAgent::new(generator.clone());

    let history = vec![Turn::user("Hello, World")];
    let outcome = agent.invoke(request(history.clone())).await.unwrap();

    assert_eq!(outcome.reply, "TUTOR REPLY");
    assert_eq!(outcome.summary, "");
    assert_eq!(outcome.style, "");
    assert_eq!(outcome.history, history);

    // One generation call: the assembled system message plus the single turn.
    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[0][0].role, "system");
    assert_eq!(calls[0][1].content, "Hello, World");
}

/// Scenario B: 13 turns trigger summarize-then-answer; the answer step runs on
/// the compacted state (3 surviving turns).
#[tokio::test]
async fn long_history_is_summarized_before_answering() {
    let generator = ScriptedGenerator::new();
    let agent = TutorAgent::new(generator.clone());

    let outcome = agent.invoke(request(alternating_history(13))).await.unwrap();

    assert_eq!(outcome.summary, "SUMMARY TEXT");
    assert_eq!(outcome.style, "STYLE TEXT");
    assert_eq!(outcome.reply, "TUTOR REPLY");

    let calls = generator.calls();
    assert_eq!(calls.len(), 3);

    // Both summarization requests carry the 12-turn prefix plus the synthetic
    // instruction.
    assert_eq!(calls[0].len(), 13);
    assert_eq!(calls[1].len(), 13);
    assert_eq!(calls[0].last().unwrap().role, "system");
    assert_eq!(calls[1].last().unwrap().role, "system");

    // The answer request sees only the 3 survivors behind the system message:
    // 13 - 10 tombstoned = 3 live turns.
    let answer_call = &calls[2];
    assert_eq!(answer_call.len(), 4);
    assert_eq!(answer_call[0].role, "system");
    assert_eq!(answer_call[1].content, "question 10");
    assert_eq!(answer_call[2].content, "answer 11");
    assert_eq!(answer_call[3].content, "question 12");
}

/// A caller-supplied prior summary is the basis of the update prompt, and the
/// post-summarization answer step embeds the regenerated summary.
#[tokio::test]
async fn prior_summary_feeds_the_update_prompt() {
    let generator = ScriptedGenerator::new();
    let agent = TutorAgent::new(generator.clone());

    let mut req = request(alternating_history(13));
    req.summary = "PRIOR SUMMARY".to_string();
    let outcome = agent.invoke(req).await.unwrap();

    let calls = generator.calls();
    let summary_call = calls
        .iter()
        .find(|c| c.last().unwrap().content.contains("Update the summary"))
        .expect("one summarization call uses the update prompt");
    assert!(summary_call
        .last()
        .unwrap()
        .content
        .contains("This is summary of the conversation to date: PRIOR SUMMARY"));

    assert_eq!(outcome.summary, "UPDATED SUMMARY TEXT");

    // The answer step's system message embeds the new summary and style.
    let answer_system = &calls[2][0].content;
    assert!(answer_system.contains("UPDATED SUMMARY TEXT"));
    assert!(answer_system.contains("STYLE TEXT"));
}

/// Below the threshold the system message carries summary/style blocks only
/// when the caller supplied them.
#[tokio::test]
async fn answer_system_message_reflects_caller_metadata() {
    let generator = ScriptedGenerator::new();
    let agent = TutorAgent::new(generator.clone());

    let mut req = request(vec![Turn::user("What is a derivative?")]);
    req.summary = "Earlier we covered limits".to_string();
    req.style = "Prefers short answers".to_string();
    req.question_context = "Question 3: differentiation".to_string();
    agent.invoke(req).await.unwrap();

    let system = generator.calls()[0][0].content.clone();
    assert!(system.contains("## Known Question Materials: Question 3: differentiation"));
    assert!(system.contains("Earlier we covered limits"));
    assert!(system.contains("Prefers short answers"));
}

/// Routing is observable at the public seam: threshold is a strict bound and a
/// trailing system turn is exempt.
#[test]
fn routing_threshold_is_strict() {
    let at = tutorloop::ConversationState::new(
        alternating_history(DEFAULT_SUMMARIZE_THRESHOLD),
        String::new(),
        String::new(),
    );
    assert_eq!(
        decide(&at, DEFAULT_SUMMARIZE_THRESHOLD).unwrap(),
        RoutingDecision::AnswerDirectly
    );

    let over = tutorloop::ConversationState::new(
        alternating_history(DEFAULT_SUMMARIZE_THRESHOLD + 1),
        String::new(),
        String::new(),
    );
    assert_eq!(
        decide(&over, DEFAULT_SUMMARIZE_THRESHOLD).unwrap(),
        RoutingDecision::Summarize
    );
}

/// An empty live history is an internal error and no generation call is made.
#[tokio::test]
async fn empty_history_fails_without_calling_the_model() {
    let generator = ScriptedGenerator::new();
    let agent = TutorAgent::new(generator.clone());

    let err = agent.invoke(request(vec![])).await.unwrap_err();
    assert!(matches!(err, TutorError::Internal(_)));
    assert_eq!(generator.call_count(), 0);
}

/// A capability failure fails the whole invocation; no partial result reaches
/// the caller.
#[tokio::test]
async fn generation_failure_is_atomic() {
    let agent = TutorAgent::new(Arc::new(FailingGenerator));

    let err = agent.invoke(request(alternating_history(13))).await.unwrap_err();
    assert!(matches!(err, TutorError::Generation(_)));
}

/// The student agent answers in character, appending the tutor's message as an
/// assistant turn, and never derives style.
#[tokio::test]
async fn student_agent_answers_in_character() {
    let generator = ScriptedGenerator::new();
    let agent = StudentAgent::new(generator.clone(), StudentProfile::Curious);

    let history = vec![Turn::assistant("Welcome! What should we work on?")];
    let mut req = request(history.clone());
    req.message = "Let's look at integration by parts.".to_string();
    req.summary = "The session covered derivatives".to_string();

    let outcome = agent.invoke(req).await.unwrap();
    assert_eq!(outcome.reply, "TUTOR REPLY");
    assert_eq!(outcome.summary, "The session covered derivatives");
    assert_eq!(outcome.style, "");
    assert_eq!(outcome.history, history);

    let call = &generator.calls()[0];
    assert_eq!(call.len(), 3);
    assert!(call[0].content.contains("curious and inquisitive student"));
    assert!(call[0].content.contains("Summary of conversation earlier"));
    assert_eq!(call[2].role, "assistant");
    assert_eq!(call[2].content, "Let's look at integration by parts.");
}

/// An unknown student profile fails at construction, before any capability
/// call occurs.
#[tokio::test]
async fn unknown_student_profile_fails_fast() {
    let generator = ScriptedGenerator::new();

    let err = StudentAgent::from_selector(generator.clone(), "overachiever").unwrap_err();
    assert!(matches!(err, TutorError::Config(_)));
    assert_eq!(generator.call_count(), 0);
}

/// Config file values are picked up from `{home}/config.toml`; temperature has
/// no environment override, so it is safe to assert here.
#[tokio::test]
async fn config_reads_temperature_from_file() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("config.toml"), "temperature = 0.4\n").unwrap();

    let config = LlmConfig::load_from(home.path()).await.unwrap();
    assert_eq!(config.temperature, 0.4);
}

#[tokio::test]
async fn malformed_config_file_is_a_config_error() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("config.toml"), "temperature = {").unwrap();

    let err = LlmConfig::load_from(home.path()).await.unwrap_err();
    assert!(matches!(err, TutorError::Config(_)));
}
