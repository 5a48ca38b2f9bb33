use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a speech provider
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
    pub voice: Option<String>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }
}

/// Encoded audio returned by a speech provider (WAV)
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
}

/// Trait for speech synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize the request text into encoded audio
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is available (API key set, engine installed, etc.)
    fn is_available(&self) -> Result<()>;
}
