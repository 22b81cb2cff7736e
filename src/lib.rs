//! Tutorloop - conversational tutoring agent
//!
//! An LLM workflow that answers student questions while keeping the model
//! context bounded:
//! - Routes each invocation between "answer directly" and "summarize, then answer"
//! - Compacts long histories into a running summary plus a conversational-style
//!   profile, tombstoning the turns the summary supersedes
//! - Assembles the tutor system prompt from persona, question materials, summary
//!   and style
//!
//! Every invocation is seeded entirely from caller-supplied data; the caller owns
//! durable storage of summary and style between calls.

pub mod agent;
pub mod context;
pub mod llm;
pub mod message;
pub mod prompts;

pub use agent::{
    decide, ConversationState, InvokeOutcome, InvokeRequest, RoutingDecision, StateUpdate,
    StudentAgent, StudentProfile, TutorAgent, DEFAULT_SUMMARIZE_THRESHOLD,
};
pub use llm::{ChatMessage, LlmConfig, OpenAiClient, TextGenerator};
pub use message::{filter_valid, Role, Turn};

/// Result type for tutorloop operations
pub type Result<T> = std::result::Result<T, TutorError>;

/// Errors that can occur in tutorloop
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    /// A structural precondition was violated. Indicates a caller or
    /// integration bug, never retried.
    #[error("internal error: {0}")]
    Internal(String),

    /// The text-generation capability failed or returned unusable output.
    #[error("text generation failed: {0}")]
    Generation(String),

    /// Unusable configuration (unknown student profile, missing credentials).
    /// Raised at construction time, before any generation call.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
