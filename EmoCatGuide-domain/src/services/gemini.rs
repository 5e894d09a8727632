//! Gemini `generateContent` client.
//!
//! Only the REST surface the app needs: a prompt with optional inline file data,
//! answered either as JSON (report extraction) or plain text (card feedback).

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::AppConfig;

const REQUEST_TIMEOUT_SECS: u64 = 90;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Errors from the Gemini API
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Gemini returned no text")]
    EmptyResponse,

    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

/// One piece of a prompt: text or inline file data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), inline_data: None }
    }

    /// File bytes sent base64-encoded alongside the prompt
    pub fn inline(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: BASE64.encode(bytes),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Strip whitespace and markdown code fences from model output
pub fn clean_model_output(raw: &str) -> String {
    raw.trim().replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse extraction output. It must be a JSON object with a `vital_stats` field.
pub fn parse_extraction(raw: &str) -> Result<Value, GeminiError> {
    let cleaned = clean_model_output(raw);
    debug!("Gemini raw output: {}", cleaned);

    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        error!("Failed to parse Gemini JSON output: {}", e);
        GeminiError::InvalidOutput(format!("not JSON: {}", e))
    })?;

    match value.as_object() {
        Some(object) if object.contains_key("vital_stats") => Ok(value),
        _ => {
            error!("Invalid JSON structure from Gemini");
            Err(GeminiError::InvalidOutput("missing vital_stats".to_string()))
        }
    }
}

/// Gemini REST client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    api_base: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, api_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.into().trim().to_string(),
            model: model.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Client for the configured key, or `None` when no key is set
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let key = config.gemini_api_key.as_deref()?.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key, config.gemini_model.clone(), config.gemini_api_base.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Call `generateContent` and return the concatenated text of the first candidate
    pub async fn generate_content(&self, parts: Vec<Part>, json_output: bool) -> Result<String, GeminiError> {
        let body = GenerateContentRequest {
            contents: vec![Content { role: Some("user".to_string()), parts }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: json_output.then(|| "application/json".to_string()),
            },
            safety_settings: HARM_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting { category, threshold: "BLOCK_NONE" })
                .collect(),
        };

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, body);
            return Err(GeminiError::Api { status, body });
        }

        let parsed: GenerateContentResponse = res.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GeminiError::EmptyResponse);
        }
        Ok(text)
    }

    /// Send a document with an extraction prompt and parse the JSON reply
    pub async fn analyze_document(&self, prompt: &str, mime_type: &str, bytes: &[u8]) -> Result<Value, GeminiError> {
        info!("Sending {} ({} bytes) to Gemini for analysis", mime_type, bytes.len());
        let text = self
            .generate_content(vec![Part::text(prompt), Part::inline(mime_type, bytes)], true)
            .await?;
        info!("Gemini analysis complete, processing returned data");
        parse_extraction(&text)
    }

    /// Plain text generation
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        let text = self.generate_content(vec![Part::text(prompt)], false).await?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::json;

    #[test]
    fn test_clean_model_output() {
        assert_eq!(clean_model_output("  ```json\n{\"a\": 1}\n```  "), "{\"a\": 1}");
        assert_eq!(clean_model_output("{}"), "{}");
    }

    #[test]
    fn test_parse_extraction() {
        let value = parse_extraction("```json\n{\"user_uid\": \"u1\", \"vital_stats\": {\"glucose\": 95}}\n```").unwrap();
        assert_eq!(value["vital_stats"]["glucose"], json!(95));

        assert!(matches!(parse_extraction("[1, 2]"), Err(GeminiError::InvalidOutput(_))));
        assert!(matches!(parse_extraction("{\"glucose\": 95}"), Err(GeminiError::InvalidOutput(_))));
        assert!(matches!(parse_extraction("I could not read this"), Err(GeminiError::InvalidOutput(_))));
    }

    #[test]
    fn test_request_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text("hi"), Part::inline("image/png", b"png")],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: Some("application/json".to_string()),
            },
            safety_settings: vec![SafetySetting { category: HARM_CATEGORIES[0], threshold: "BLOCK_NONE" }],
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["data"], BASE64.encode(b"png"));
        assert_eq!(value["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = AppConfig::default();
        assert!(GeminiClient::from_config(&config).is_none());

        config.gemini_api_key = Some("  ".to_string());
        assert!(GeminiClient::from_config(&config).is_none());

        config.gemini_api_key = Some("key".to_string());
        let client = GeminiClient::from_config(&config).unwrap();
        assert_eq!(client.model(), config.gemini_model);
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_analyze_document_against_local_server() {
        let app = Router::new().route(
            "/models/*call",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "application/pdf");
                Json(json!({
                    "candidates": [{
                        "content": { "parts": [{ "text": "```json\n{\"vital_stats\": {\"SGPT\": 50}}\n```" }] }
                    }]
                }))
            }),
        );
        let base = serve(app).await;

        let client = GeminiClient::new("key", "test-model", base);
        let value = client.analyze_document("extract", "application/pdf", b"%PDF-1.4").await.unwrap();
        assert_eq!(value["vital_stats"]["SGPT"], json!(50));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let app = Router::new().route(
            "/models/*call",
            post(|| async { (axum::http::StatusCode::FORBIDDEN, "bad key") }),
        );
        let base = serve(app).await;

        let client = GeminiClient::new("key", "test-model", base);
        match client.generate_text("hello").await {
            Err(GeminiError::Api { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "bad key");
            },
            other => panic!("expected API error, got {:?}", other),
        }
    }
}
