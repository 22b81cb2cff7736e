//! Agent module: conversation state, the tutor workflow, and the
//! simulated-student variant.

mod state;
mod student;
mod summarize;
mod workflow;

pub use state::{ConversationState, StateUpdate};
pub use student::{StudentAgent, StudentProfile};
pub use workflow::{
    decide, InvokeOutcome, InvokeRequest, RoutingDecision, TutorAgent,
    DEFAULT_SUMMARIZE_THRESHOLD,
};
