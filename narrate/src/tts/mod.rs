//! Segment synthesis: one text segment to one audio clip.

use crate::audio::AudioClip;
use crate::error::{ConversionError, Result};
use crate::text::Segment;
use speech_client::{SpeechAudio, SpeechProvider, SpeechRequest};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Fixed synthesis parameters applied to every segment.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Language code passed to the engine
    pub language: String,
    /// Engine-specific voice name (None = engine default)
    pub voice: Option<String>,
    /// Attempts per segment for transient failures
    pub max_retries: u32,
    /// Base delay between attempts; grows linearly
    pub retry_delay: Duration,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            voice: None,
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl SynthesisOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the voice name.
    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }

    /// Set the number of attempts (at least one).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the base delay between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Converts segments to clips through an external speech provider.
pub struct SegmentSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    options: SynthesisOptions,
}

impl SegmentSynthesizer {
    pub fn new(provider: Arc<dyn SpeechProvider>, options: SynthesisOptions) -> Self {
        Self { provider, options }
    }

    /// Synthesize one segment into the transient file at `output_path`, then
    /// decode it.
    ///
    /// The file is created exclusively; an existing file at that path is an error.
    pub async fn synthesize(&self, segment: &Segment, output_path: &Path) -> Result<AudioClip> {
        let audio = self.request_with_retry(segment).await?;

        // No await between create and close: once this future is dropped the
        // file either exists in full or was never created.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(output_path)?;
        file.write_all(&audio.bytes)?;
        drop(file);

        log::debug!(
            "Segment {}: {} chars saved => {}",
            segment.index + 1,
            segment.char_len(),
            output_path.display()
        );

        AudioClip::load(output_path).await
    }

    async fn request_with_retry(&self, segment: &Segment) -> Result<SpeechAudio> {
        let request = SpeechRequest::new(segment.text.clone(), self.options.language.clone())
            .with_voice(self.options.voice.clone());
        let attempts = self.options.max_retries.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.provider.synthesize(request.clone()).await {
                Ok(audio) => return Ok(audio),
                Err(e) if e.is_transient() && attempt < attempts => {
                    log::warn!(
                        "Generation failed for segment {} (attempt {}/{}): {}",
                        segment.index + 1,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(self.options.retry_delay * attempt).await;
                }
                Err(e) => {
                    return Err(ConversionError::Synthesis {
                        segment: segment.index,
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TEST_SAMPLE_RATE, tone_for, tone_provider};
    use speech_client::{MockProvider, SpeechError};
    use tempfile::TempDir;

    fn fast_options() -> SynthesisOptions {
        SynthesisOptions::new().with_retry_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_options_default() {
        let opts = SynthesisOptions::default();
        assert_eq!(opts.language, "en");
        assert!(opts.voice.is_none());
        assert_eq!(opts.max_retries, 2);
    }

    #[test]
    fn test_options_builder() {
        let opts = SynthesisOptions::new()
            .with_language("fr")
            .with_voice(Some("fr-fr".into()))
            .with_max_retries(0);
        assert_eq!(opts.language, "fr");
        assert_eq!(opts.voice.as_deref(), Some("fr-fr"));
        assert_eq!(opts.max_retries, 1);
    }

    #[tokio::test]
    async fn test_synthesize_writes_transient_file() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(tone_provider());
        let synth = SegmentSynthesizer::new(provider.clone(), fast_options());
        let path = dir.path().join("seg0000.wav");

        let clip = synth
            .synthesize(&Segment::new(0, "hello".into()), &path)
            .await
            .unwrap();

        assert_eq!(clip.frames(), 5);
        assert_eq!(clip.format().sample_rate, TEST_SAMPLE_RATE);
        assert_eq!(std::fs::read(&path).unwrap(), tone_for("hello"));
        assert_eq!(provider.requests(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_existing_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken.wav");
        std::fs::write(&path, b"other job").unwrap();

        let synth = SegmentSynthesizer::new(Arc::new(tone_provider()), fast_options());
        let result = synth.synthesize(&Segment::new(0, "hi".into()), &path).await;
        assert!(matches!(result, Err(ConversionError::Io(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"other job");
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::fails_then_succeeds(
            1,
            SpeechError::RateLimited { retry_after: None },
            &tone_for("abc"),
        ));
        let synth = SegmentSynthesizer::new(provider.clone(), fast_options());

        let clip = synth
            .synthesize(&Segment::new(0, "abc".into()), &dir.path().join("s.wav"))
            .await
            .unwrap();
        assert_eq!(clip.frames(), 3);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::always_fails(SpeechError::ApiError {
            message: "text rejected".into(),
            status_code: Some(400),
        }));
        let synth = SegmentSynthesizer::new(provider.clone(), fast_options());
        let path = dir.path().join("s.wav");

        let err = synth
            .synthesize(&Segment::new(4, "abc".into()), &path)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Synthesis { segment: 4, .. }));
        assert_eq!(provider.call_count(), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::always_fails(SpeechError::Network(
            "connection refused".into(),
        )));
        let synth =
            SegmentSynthesizer::new(provider.clone(), fast_options().with_max_retries(3));

        let err = synth
            .synthesize(&Segment::new(0, "abc".into()), &dir.path().join("s.wav"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "synthesis_error");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_undecodable_audio_is_assembly_error() {
        let dir = TempDir::new().unwrap();
        let synth = SegmentSynthesizer::new(
            Arc::new(MockProvider::always_succeeds(b"ID3 mp3 bytes")),
            fast_options(),
        );
        let err = synth
            .synthesize(&Segment::new(0, "abc".into()), &dir.path().join("s.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Assembly(_)));
    }
}
