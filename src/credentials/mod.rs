pub mod prompt;

use std::io::IsTerminal;

use crate::feedback::FeedbackError;

pub use prompt::prompt_for_api_key;

/// Check for an API key in the given environment variable.
/// Returns Some(key) if the variable is set and non-empty, None otherwise.
pub fn get_api_key_from_env(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

/// Resolve the feedback API key: environment first, then an interactive
/// prompt when stdin is a terminal.
pub fn resolve_api_key(var: &str) -> Result<String, FeedbackError> {
    if let Some(key) = get_api_key_from_env(var) {
        tracing::debug!("API key read from {}", var);
        return Ok(key);
    }

    if !std::io::stdin().is_terminal() {
        return Err(FeedbackError::MissingApiKey(var.to_string()));
    }

    prompt_for_api_key(var).map_err(|e| {
        tracing::warn!("API key prompt failed: {:#}", e);
        FeedbackError::MissingApiKey(var.to_string())
    })
}
