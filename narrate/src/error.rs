//! Error taxonomy for conversion jobs.

use speech_client::SpeechError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Speech synthesis failed for segment {segment}: {source}")]
    Synthesis {
        segment: usize,
        #[source]
        source: SpeechError,
    },

    #[error("Audio assembly failed: {0}")]
    Assembly(String),

    #[error("No text could be extracted from the document.")]
    NoExtractableText,

    #[error("Could not read document: {0}")]
    Extraction(String),

    #[error("Artifact store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Stable taxonomy code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Synthesis { .. } => "synthesis_error",
            Self::Assembly(_) => "assembly_error",
            Self::NoExtractableText => "no_extractable_text",
            Self::Extraction(_) => "extraction_error",
            Self::Store(_) | Self::Io(_) => "store_error",
        }
    }

    /// User-correctable errors; everything else is a service failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::NoExtractableText | Self::Extraction(_)
        )
    }
}

impl From<hound::Error> for ConversionError {
    fn from(err: hound::Error) -> Self {
        Self::Assembly(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// A transient file that could not be removed. Logged, never escalated.
#[derive(Debug, Clone)]
pub struct ArtifactCleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for ArtifactCleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not remove {}: {}", self.path.display(), self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_classes() {
        let err = ConversionError::InvalidInput("empty".into());
        assert_eq!(err.code(), "invalid_input");
        assert!(err.is_client_error());

        let err = ConversionError::NoExtractableText;
        assert_eq!(err.code(), "no_extractable_text");
        assert!(err.is_client_error());

        let err = ConversionError::Synthesis {
            segment: 3,
            source: SpeechError::EmptyAudio,
        };
        assert_eq!(err.code(), "synthesis_error");
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("segment 3"));

        let err = ConversionError::Assembly("bad header".into());
        assert_eq!(err.code(), "assembly_error");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_cleanup_warning_display() {
        let warning = ArtifactCleanupWarning {
            path: PathBuf::from("/tmp/seg0001.wav"),
            reason: "in use".into(),
        };
        assert_eq!(warning.to_string(), "could not remove /tmp/seg0001.wav: in use");
    }
}
