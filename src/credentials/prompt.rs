use anyhow::{Context, Result};

/// Prompts the evaluator for a Gemini API key without echoing it.
/// The key is used for this run only.
pub fn prompt_for_api_key(var: &str) -> Result<String> {
    eprintln!("Gemini API key required for feedback generation.");
    eprintln!("Create one at: https://aistudio.google.com/apikey");
    eprintln!("Set {} to skip this prompt next time.", var);
    eprintln!();

    let key = rpassword::prompt_password("Enter API key: ")
        .context("Failed to read API key from terminal")?;

    let key = key.trim();

    if key.is_empty() {
        anyhow::bail!("API key cannot be empty");
    }

    Ok(key.to_string())
}
