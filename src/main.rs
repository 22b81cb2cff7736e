//! Tutorloop CLI
//!
//! Runs one tutoring-workflow invocation: reads a request as JSON (file or
//! stdin), calls the configured LLM, prints the reply plus the updated
//! summary/style metadata the caller should persist for the next call.

use clap::Parser;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tutorloop::{
    context, InvokeRequest, LlmConfig, OpenAiClient, StudentAgent, TutorAgent, TutorError, Turn,
};

/// Simulated students converse at a higher temperature than the tutor.
const STUDENT_TEMPERATURE: f32 = 0.75;

/// Tutorloop - conversational tutoring agent
#[derive(Parser, Debug)]
#[command(name = "tutorloop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the request JSON file; reads stdin when omitted
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Run the simulated-student agent with this profile instead of the tutor
    /// (base, curious, contradicting, reliant, confused, unrelated)
    #[arg(long)]
    student: Option<String>,

    /// Override the summarize threshold (turn count)
    #[arg(long)]
    threshold: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// One invocation request, in the caller's wire format.
#[derive(Debug, Deserialize)]
struct Request {
    message: String,
    conversation_id: Option<String>,
    #[serde(default)]
    conversation_history: Vec<Turn>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    conversational_style: String,
    #[serde(default)]
    question_response_details: serde_json::Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let raw = read_request(cli.request.as_deref())?;
    let request: Request = serde_json::from_str(&raw)?;

    let session_id = request.conversation_id.clone().ok_or_else(|| {
        TutorError::Internal("the conversation id is required in the request parameters".to_string())
    })?;

    let question_context = context::render_question_details(&request.question_response_details)?
        .unwrap_or_default();

    info!(session_id = %session_id, "processing request");
    let started = Instant::now();

    let invoke = InvokeRequest {
        message: request.message,
        history: request.conversation_history,
        session_id,
        summary: request.summary,
        style: request.conversational_style,
        question_context,
    };

    let outcome = match &cli.student {
        Some(profile) => {
            let config = LlmConfig::load().await?.with_temperature(STUDENT_TEMPERATURE);
            let generator = Arc::new(OpenAiClient::new(config)?);
            // Profile validation happens before any generation call.
            let agent = StudentAgent::from_selector(generator, profile)?;
            agent.invoke(invoke).await?
        }
        None => {
            let config = LlmConfig::load().await?;
            let generator = Arc::new(OpenAiClient::new(config)?);
            let mut agent = TutorAgent::new(generator);
            if let Some(threshold) = cli.threshold {
                agent = agent.with_threshold(threshold);
            }
            agent.invoke(invoke).await?
        }
    };

    let elapsed = started.elapsed();
    let result = serde_json::json!({
        "chatbot_response": outcome.reply,
        "summary": outcome.summary,
        "conversational_style": outcome.style,
        "conversation_history": outcome.history,
        "processing_time": elapsed.as_secs_f64(),
    });

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn read_request(path: Option<&std::path::Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
