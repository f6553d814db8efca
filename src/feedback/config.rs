use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_LANGUAGE: &str = "Spanish";

/// Feedback generation settings.
///
/// Example YAML:
/// ```yaml
/// feedback:
///   model: gemini-2.5-flash
///   temperature: 0.6
///   timeout: 45s
///   retries: 2
///   language: Spanish
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FeedbackConfig {
    /// Model name (default: gemini-2.5-flash)
    #[serde(default)]
    pub model: Option<String>,

    /// API root, without trailing slash
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable holding the API key (default: GEMINI_API_KEY)
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub top_p: Option<f64>,

    #[serde(default)]
    pub top_k: Option<u32>,

    /// Request timeout as a human duration, e.g. "30s" or "2m" (default: 60s)
    #[serde(default)]
    pub timeout: Option<String>,

    /// Retries after a transient failure (default: 2)
    #[serde(default)]
    pub retries: Option<usize>,

    /// Language the feedback is written in (default: Spanish)
    #[serde(default)]
    pub language: Option<String>,
}

impl FeedbackConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(0.6)
    }

    pub fn top_p(&self) -> f64 {
        self.top_p.unwrap_or(0.9)
    }

    pub fn top_k(&self) -> u32 {
        self.top_k.unwrap_or(40)
    }

    pub fn retries(&self) -> usize {
        self.retries.unwrap_or(2)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn timeout(&self) -> Result<Duration> {
        match self.timeout {
            Some(ref t) => humantime::parse_duration(t)
                .with_context(|| format!("Invalid feedback timeout '{}'", t)),
            None => Ok(Duration::from_secs(60)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeedbackConfig::default();
        assert_eq!(config.model(), "gemini-2.5-flash");
        assert_eq!(config.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(config.temperature(), 0.6);
        assert_eq!(config.top_p(), 0.9);
        assert_eq!(config.top_k(), 40);
        assert_eq!(config.retries(), 2);
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_with_timeout() {
        let yaml = r#"
model: gemini-2.0-pro
base_url: "http://localhost:8080/v1/"
timeout: 2m
"#;
        let config: FeedbackConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.model(), "gemini-2.0-pro");
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_timeout() {
        let config = FeedbackConfig {
            timeout: Some("later".to_string()),
            ..FeedbackConfig::default()
        };
        assert!(config.timeout().is_err());
    }
}
