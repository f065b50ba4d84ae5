//! Implements the `Generator` trait using the Gemini `generateContent` REST endpoint.

use crate::ai::{ApiKey, Generator, Prompt, ResponseFormat};
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

/// A `Generator` that calls `{endpoint}/models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct Gemini {
    client: reqwest::Client,
    url: Url,
    api_key: ApiKey,
}

impl Gemini {
    pub fn new(endpoint: Url, model: &str, api_key: ApiKey) -> Result<Self> {
        let url = generate_content_url(&endpoint, model)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build the HTTP client")?;
        Ok(Self {
            client,
            url,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl Generator for Gemini {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        debug!("Sending {:?} prompt to {}", prompt.format, self.url);
        trace!("Prompt:\n{}", prompt.text);

        let response = self
            .client
            .post(self.url.clone())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&GenerateContentRequest::from(prompt))
            .send()
            .await
            .context("Failed to send request to the Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Gemini API request failed with status {}: {}", status, body);
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;
        let text = body
            .first_text()
            .context("Gemini API response contained no text")?;
        trace!("Reply:\n{text}");
        Ok(text)
    }
}

/// Joins `models/{model}:generateContent` onto the endpoint, which may or may not end in a slash.
fn generate_content_url(endpoint: &Url, model: &str) -> Result<Url> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("models/{model}:generateContent"))
        .with_context(|| format!("Unable to build the Gemini URL for model '{model}'"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

impl<'a> From<&'a Prompt> for GenerateContentRequest<'a> {
    fn from(prompt: &'a Prompt) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: &prompt.text }],
            }],
            generation_config: match prompt.format {
                ResponseFormat::Json => Some(GenerationConfig {
                    response_mime_type: "application/json",
                }),
                ResponseFormat::Text => None,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// The text of the first part of the first candidate.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_content_url() {
        let model = "gemini-2.5-flash-preview-09-2025";
        let expected = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-preview-09-2025:generateContent";

        let without_slash = Url::parse("https://generativelanguage.googleapis.com/v1beta").unwrap();
        assert_eq!(
            generate_content_url(&without_slash, model).unwrap().as_str(),
            expected
        );

        let with_slash = Url::parse("https://generativelanguage.googleapis.com/v1beta/").unwrap();
        assert_eq!(
            generate_content_url(&with_slash, model).unwrap().as_str(),
            expected
        );
    }

    #[test]
    fn test_json_request_body() {
        let prompt = Prompt::json("extract this");
        let body = serde_json::to_value(GenerateContentRequest::from(&prompt)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{"parts": [{"text": "extract this"}]}],
                "generationConfig": {"responseMimeType": "application/json"}
            })
        );
    }

    #[test]
    fn test_text_request_body_has_no_generation_config() {
        let prompt = Prompt::text("summarize");
        let body = serde_json::to_value(GenerateContentRequest::from(&prompt)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"contents": [{"parts": [{"text": "summarize"}]}]})
        );
    }

    #[test]
    fn test_first_text() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"amount\": 450}"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_text().unwrap(), "{\"amount\": 450}");
    }

    #[test]
    fn test_first_text_missing() {
        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.first_text().is_none());

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert!(blocked.first_text().is_none());
    }
}
