//! Text chunking for TTS processing.

use super::Segment;
use crate::error::{ConversionError, Result};

/// Default maximum segment size in characters.
pub const DEFAULT_CHUNK_LIMIT: usize = 250;

/// Split text into segments of at most `limit` characters on word boundaries.
///
/// Tokens are packed greedily in their original order. A single token longer
/// than `limit` is emitted whole as its own segment; content is never dropped
/// or truncated.
///
/// # Errors
/// `InvalidInput` if the text is empty or whitespace-only, or `limit` is zero.
pub fn split(text: &str, limit: usize) -> Result<Vec<Segment>> {
    if limit == 0 {
        return Err(ConversionError::InvalidInput(
            "Chunk limit must be positive.".into(),
        ));
    }
    if text.trim().is_empty() {
        return Err(ConversionError::InvalidInput(
            "Text for audio conversion is empty.".into(),
        ));
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        // +1 for the joining space
        if current_len + word_len + 1 <= limit {
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(word);
            current_len = word_len;
        }
    }

    // Don't forget the last chunk
    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(index, text)| Segment::new(index, text))
        .collect())
}
