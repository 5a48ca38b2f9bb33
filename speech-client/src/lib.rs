//! Speech synthesis client library for the narrate workspace
//!
//! Provides a unified interface over speech engines:
//! - Local command-line engines (espeak-ng, piper, ...)
//! - OpenAI-compatible `/audio/speech` HTTP services
//! - A scripted mock for tests

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::ProviderConfig;
pub use error::{Result, SpeechError};
pub use provider::{SpeechAudio, SpeechProvider, SpeechRequest};
pub use providers::{MockProvider, ProviderKind, get_provider};
