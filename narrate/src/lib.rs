//! # narrate
//!
//! Converts text and PDF documents into spoken audio.
//!
//! Text is split into word-aligned segments, each segment is synthesized by a
//! speech engine into a transient WAV file, and the decoded clips are joined in
//! order into one track. Documents are converted page by page, with an optional
//! merged file covering every page.

pub mod audio;
pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod text;
pub mod tts;

#[cfg(test)]
mod testing;

pub use error::{ConversionError, Result};
