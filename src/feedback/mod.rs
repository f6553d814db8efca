pub mod config;
pub mod gemini;
pub mod prompt;

pub use config::FeedbackConfig;
pub use gemini::GeminiClient;
pub use prompt::{build_prompt, Prompt};

use std::fmt;
use std::future::Future;

use crate::evaluation::GroundingMetadata;
use crate::rubric::{Rubric, ScoreSet};

/// Generated narrative feedback plus any sources the model consulted
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub text: String,
    pub grounding: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackError {
    /// No API key in the named environment variable and none entered
    MissingApiKey(String),
    /// Transport failure (connection, timeout, TLS)
    Request(String),
    /// The API answered with a non-success status
    Api { status: u16, message: String },
    /// The response carried no usable text
    EmptyResponse,
    /// The response body could not be decoded
    InvalidResponse(String),
}

impl FeedbackError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FeedbackError::Request(_) => true,
            FeedbackError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for FeedbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackError::MissingApiKey(var) => {
                write!(f, "API key not configured (set {})", var)
            }
            FeedbackError::Request(msg) => write!(f, "Feedback request failed: {}", msg),
            FeedbackError::Api { status, message } => {
                write!(f, "Feedback API error ({}): {}", status, message)
            }
            FeedbackError::EmptyResponse => write!(f, "Feedback API returned no text"),
            FeedbackError::InvalidResponse(msg) => {
                write!(f, "Could not decode feedback response: {}", msg)
            }
        }
    }
}

impl std::error::Error for FeedbackError {}

/// Produces narrative feedback for a scored student.
pub trait FeedbackGenerator {
    fn generate(
        &self,
        student_name: &str,
        scores: &ScoreSet,
        rubric: &Rubric,
    ) -> impl Future<Output = Result<Feedback, FeedbackError>> + Send;
}
