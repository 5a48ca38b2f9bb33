//! Text processing for TTS: splitting input into synthesizer-sized segments.

pub mod chunker;

pub use chunker::{DEFAULT_CHUNK_LIMIT, split};

/// A bounded slice of the input text ready for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position of this segment within its text
    pub index: usize,
    /// The text content
    pub text: String,
}

impl Segment {
    /// Create a new segment.
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
