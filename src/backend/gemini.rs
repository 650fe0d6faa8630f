//! Generative Language API backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::client::{BackendError, TextBackend};
use crate::config::BackendConfig;

/// Longest error body kept in a [`BackendError::Status`] message.
const MAX_ERROR_BODY: usize = 512;

pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    max_output_tokens: u32,
}

impl GeminiBackend {
    pub fn new(client: reqwest::Client, config: &BackendConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            api_key: config.api_key.clone(),
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn endpoint(&self, model: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(&format!("/v1beta/models/{}:generateContent", model))
            .map_err(|e| BackendError::Other(format!("invalid model endpoint for {}: {}", model, e)))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Text parts of the first candidate, in order.
fn extract_text(response: GenerateContentResponse) -> Vec<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default()
}

/// Cut `body` to at most [`MAX_ERROR_BODY`] bytes on a char boundary.
fn truncate_error_body(body: &mut String) {
    if body.len() <= MAX_ERROR_BODY {
        return;
    }
    let mut cut = MAX_ERROR_BODY;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    body.truncate(cut);
}

#[async_trait]
impl TextBackend for GeminiBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Vec<String>, BackendError> {
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint(model)?)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_error_body(&mut body);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(extract_text(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> GeminiBackend {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            api_key: "k".to_string(),
            ..BackendConfig::default()
        };
        GeminiBackend::new(reqwest::Client::new(), &config).unwrap()
    }

    #[test]
    fn test_endpoint_includes_model() {
        let url = backend("https://generativelanguage.googleapis.com").endpoint("gemini-pro").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [TextPart { text: "hi" }],
            }],
            generation_config: GenerationConfig { max_output_tokens: 16 },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "generationConfig": {"maxOutputTokens": 16}
            })
        );
    }

    #[test]
    fn test_extracts_first_candidate_text_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "one"}, {"inlineData": {}}, {"text": "two"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(extract_text(response), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}],
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(extract_text(response).is_empty());

        let empty: GenerateContentResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(extract_text(empty).is_empty());
    }

    #[test]
    fn test_error_body_truncated_on_char_boundary() {
        let mut short = "not found".to_string();
        truncate_error_body(&mut short);
        assert_eq!(short, "not found");

        // 'é' is two bytes, so byte 512 falls inside a character.
        let mut long = format!("x{}", "é".repeat(400));
        truncate_error_body(&mut long);
        assert_eq!(long.len(), 511);
        assert!(long.ends_with('é'));
    }
}
