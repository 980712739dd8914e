// Gemini REST client (generateContent)

use super::{ContentRequest, GenerativeModel, Part};
use crate::config::AiConfig;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
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

impl From<ContentRequest> for GenerateContentRequest {
    fn from(request: ContentRequest) -> Self {
        let parts = request
            .parts
            .into_iter()
            .map(|part| match part {
                Part::Text(text) => WirePart {
                    text: Some(text),
                    inline_data: None,
                },
                Part::InlineData { mime_type, data } => WirePart {
                    text: None,
                    inline_data: Some(InlineData { mime_type, data }),
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: request.response_schema.map(|schema| GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate ("" when there is none)
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout_seconds: u64,
}

impl GeminiClient {
    /// Build a client, reading the API key from `config.api_key_env`.
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!("Environment variable {} is not set", config.api_key_env)
        })?;
        Self::new(config, api_key)
    }

    pub fn new(config: &AiConfig, api_key: String) -> Result<Self> {
        info!("Initializing Gemini client with model {}", config.model);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate_content(&self, request: ContentRequest) -> Result<String> {
        let url = self.endpoint();
        let body = GenerateContentRequest::from(request);
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timed out after {}s", self.timeout_seconds)
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to {}", self.base_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API error {}: {}", status, body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        Ok(parsed.text())
    }
}

impl GenerativeModel for GeminiClient {
    fn generate<'a>(&'a self, request: ContentRequest) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.generate_content(request))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = ContentRequest::text("hello")
            .with_part(Part::InlineData {
                mime_type: "application/pdf".to_string(),
                data: "QUJD".to_string(),
            })
            .with_schema(json!({"type": "ARRAY"}));

        let body = serde_json::to_value(GenerateContentRequest::from(request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            body["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert!(body["contents"][0]["parts"][1].get("text").is_none());
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn test_request_without_schema_has_no_generation_config() {
        let body =
            serde_json::to_value(GenerateContentRequest::from(ContentRequest::text("x"))).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "[{\"a\":"}, {"text": "1}]"}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response.text(), "[{\"a\":1}]");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), "");
    }

    #[test]
    fn test_endpoint_uses_model() {
        let config = AiConfig {
            base_url: "https://example.test/".to_string(),
            ..AiConfig::default()
        };
        let client = GeminiClient::new(&config, "key".to_string()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.model_name(), "gemini-2.5-flash");
    }
}
