//! OpenAI-compatible speech API provider
//!
//! Used for services that implement the OpenAI `/audio/speech` endpoint:
//! - OpenAI
//! - Kokoro-FastAPI, openedai-speech and other self-hosted servers

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechAudio, SpeechProvider, SpeechRequest};

const DEFAULT_VOICE: &str = "alloy";

/// Provider for OpenAI-compatible speech APIs
pub struct OpenAICompatibleProvider {
    model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAICompatibleProvider {
    /// Create a new OpenAI-compatible provider
    pub fn new(model: &str, base_url: &str, api_key: String) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct SpeechCreateRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl SpeechProvider for OpenAICompatibleProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio> {
        let body = SpeechCreateRequest {
            model: &self.model,
            input: &request.text,
            voice: request.voice.as_deref().unwrap_or(DEFAULT_VOICE),
            response_format: "wav",
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            return Err(match status.as_u16() {
                429 => SpeechError::RateLimited { retry_after },
                503 => SpeechError::ServerOverloaded { message },
                code => SpeechError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Network(format!("Failed to read audio: {}", e)))?;

        if bytes.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
        })
    }

    fn name(&self) -> &'static str {
        "OpenAI-compatible"
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let provider =
            OpenAICompatibleProvider::new("tts-1", "http://localhost:8880/v1/", "k".into())
                .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8880/v1/audio/speech");
    }

    #[test]
    fn test_request_body_shape() {
        let body = SpeechCreateRequest {
            model: "tts-1",
            input: "Hello",
            voice: DEFAULT_VOICE,
            response_format: "wav",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["input"], "Hello");
        assert_eq!(json["voice"], "alloy");
        assert_eq!(json["response_format"], "wav");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transient() {
        // Port 9 (discard) is almost never listening on localhost.
        let provider =
            OpenAICompatibleProvider::new("tts-1", "http://127.0.0.1:9/v1", "k".into()).unwrap();
        let err = provider
            .synthesize(SpeechRequest::new("hello", "en"))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err}");
    }
}
