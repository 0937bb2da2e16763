use async_trait::async_trait;
use hub_config::AssistConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GenerationError, TextGenerator};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
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

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: AssistConfig,
}

impl GeminiClient {
    pub fn new(config: AssistConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("Requesting generation from model {}", self.config.model);
        let response = self
            .http
            .post(self.config.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        parse_response(&bytes)
    }
}

fn parse_response(bytes: &[u8]) -> Result<String, GenerationError> {
    let parsed: GenerateResponse =
        serde_json::from_slice(bytes).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    parsed.first_text().ok_or(GenerationError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_candidate() {
        let body = br#"{
            "candidates": [
                {"content": {"parts": [{"text": "1. Welcome"}, {"text": "ignored"}]}},
                {"content": {"parts": [{"text": "second"}]}}
            ]
        }"#;
        assert_eq!(parse_response(body).unwrap(), "1. Welcome");
    }

    #[test]
    fn test_parse_without_candidates_is_empty() {
        assert!(matches!(parse_response(b"{}"), Err(GenerationError::Empty)));
        assert!(matches!(
            parse_response(br#"{"candidates": [{"content": {"parts": []}}]}"#),
            Err(GenerationError::Empty)
        ));
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_response(b"<html>"),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back() {
        let client = GeminiClient::new(AssistConfig {
            api_key: "k".to_string(),
            model: "m".to_string(),
            // Port 9 (discard) on loopback refuses connections.
            endpoint: "http://127.0.0.1:9".to_string(),
        });
        assert_eq!(client.generate("hello").await, crate::FAILURE_FALLBACK);
    }
}
