use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, warn};

use super::config::FeedbackConfig;
use super::prompt::{build_prompt, Prompt};
use super::{Feedback, FeedbackError, FeedbackGenerator};
use crate::evaluation::{GroundingMetadata, SourceAttribution};
use crate::rubric::{Rubric, ScoreSet};

/// Client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    config: FeedbackConfig,
    institution: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: RequestContent<'a>,
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    grounding_metadata: Option<ApiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGroundingMetadata {
    #[serde(default)]
    web_search_queries: Vec<String>,
    #[serde(default)]
    grounding_chunks: Vec<ApiGroundingChunk>,
    #[serde(default)]
    grounding_attributions: Vec<ApiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGroundingChunk {
    web: Option<ApiSource>,
    retrieved_context: Option<ApiSource>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GeminiClient {
    /// Create a client. Fails only if the timeout is invalid or the HTTP
    /// client cannot be built.
    pub fn new(
        api_key: String,
        config: FeedbackConfig,
        institution: Option<String>,
    ) -> Result<Self> {
        crate::install_crypto_provider();

        let http = reqwest::Client::builder()
            .timeout(config.timeout()?)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_key,
            config,
            institution,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        )
    }

    fn request_body<'a>(&self, prompt: &'a Prompt) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: RequestContent {
                role: None,
                parts: vec![RequestPart {
                    text: &prompt.system_instruction,
                }],
            },
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart {
                    text: &prompt.user_prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature(),
                top_p: self.config.top_p(),
                top_k: self.config.top_k(),
            },
        }
    }

    async fn send_once(
        &self,
        body: &GenerateContentRequest<'_>,
    ) -> Result<Feedback, FeedbackError> {
        let result = self.try_send(body).await;
        if let Err(ref e) = result {
            if e.is_transient() {
                warn!("Transient feedback failure: {}", e);
            }
        }
        result
    }

    async fn try_send(
        &self,
        body: &GenerateContentRequest<'_>,
    ) -> Result<Feedback, FeedbackError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| FeedbackError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FeedbackError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(FeedbackError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| FeedbackError::InvalidResponse(e.to_string()))?;
        parse_response(parsed)
    }
}

impl FeedbackGenerator for GeminiClient {
    async fn generate(
        &self,
        student_name: &str,
        scores: &ScoreSet,
        rubric: &Rubric,
    ) -> Result<Feedback, FeedbackError> {
        let prompt = build_prompt(
            student_name,
            scores,
            rubric,
            self.institution.as_deref(),
            self.config.language(),
        );
        let body = self.request_body(&prompt);

        debug!(
            "Requesting feedback from {} for {}",
            self.config.model(),
            student_name
        );

        // Retry strategy: exponential backoff, transient failures only
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(std::time::Duration::from_secs(5))
            .take(self.config.retries());

        RetryIf::spawn(
            retry_strategy,
            || self.send_once(&body),
            FeedbackError::is_transient,
        )
        .await
    }
}

/// Concatenate the text parts of the first candidate and collect its grounding
fn parse_response(response: GenerateContentResponse) -> Result<Feedback, FeedbackError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(FeedbackError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(FeedbackError::EmptyResponse);
    }

    let grounding = candidate
        .grounding_metadata
        .map(convert_grounding)
        .filter(|g| !g.is_empty());

    Ok(Feedback {
        text: text.trim().to_string(),
        grounding,
    })
}

fn convert_grounding(meta: ApiGroundingMetadata) -> GroundingMetadata {
    let attributions = meta
        .grounding_chunks
        .into_iter()
        .chain(meta.grounding_attributions)
        .filter_map(|chunk| chunk.web.or(chunk.retrieved_context))
        .filter_map(|source| {
            source.uri.map(|uri| SourceAttribution {
                uri,
                title: source.title.unwrap_or_default(),
            })
        })
        .collect();

    GroundingMetadata {
        web_search_queries: meta.web_search_queries,
        attributions,
    }
}

/// Extract `error.message` from an API error body, falling back to the raw text
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error details".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(
            "test-key".to_string(),
            FeedbackConfig::default(),
            Some("Liceo".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_uses_model() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let prompt = Prompt {
            system_instruction: "system".to_string(),
            user_prompt: "user".to_string(),
        };
        let client = client();
        let value = serde_json::to_value(client.request_body(&prompt)).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "system");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "user");
        assert_eq!(value["generationConfig"]["temperature"], 0.6);
        assert_eq!(value["generationConfig"]["topP"], 0.9);
        assert_eq!(value["generationConfig"]["topK"], 40);
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Estimada Ana,\n"}, {"text": "buen trabajo."}]}
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let feedback = parse_response(response).unwrap();
        assert_eq!(feedback.text, "Estimada Ana,\nbuen trabajo.");
        assert!(feedback.grounding.is_none());
    }

    #[test]
    fn test_parse_response_with_grounding() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Feedback"}]},
                "groundingMetadata": {
                    "webSearchQueries": ["oratoria escolar"],
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "A"}},
                        {"retrievedContext": {"uri": "https://b.example"}},
                        {"web": {"title": "no uri"}}
                    ]
                }
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let grounding = parse_response(response).unwrap().grounding.unwrap();

        assert_eq!(grounding.web_search_queries, vec!["oratoria escolar"]);
        assert_eq!(grounding.attributions.len(), 2);
        assert_eq!(grounding.attributions[0].title, "A");
        assert_eq!(grounding.attributions[1].uri, "https://b.example");
        assert_eq!(grounding.attributions[1].title, "");
    }

    #[test]
    fn test_parse_response_empty() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(
            parse_response(response).unwrap_err(),
            FeedbackError::EmptyResponse
        );

        let json = r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parse_response(response).unwrap_err(),
            FeedbackError::EmptyResponse
        );
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "API key not valid");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(api_error_message(""), "no error details");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        let config = FeedbackConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            retries: Some(0),
            timeout: Some("2s".to_string()),
            ..FeedbackConfig::default()
        };
        let client = GeminiClient::new("k".to_string(), config, None).unwrap();
        let err = client
            .generate("Ana", &ScoreSet::new(), &crate::rubric::reference_rubric())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Request(_)));
    }
}
