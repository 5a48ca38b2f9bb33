//! narrate configuration management.

use crate::text::DEFAULT_CHUNK_LIMIT;
use crate::tts::SynthesisOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use speech_client::ProviderConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrateConfig {
    /// Maximum characters per synthesized segment
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,

    /// Language code passed to the speech engine
    #[serde(default = "default_language")]
    pub language: String,

    /// Engine voice name. None means the engine default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Directory for finished audio files, served under /static
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for per-segment scratch files. None means the system temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    /// Segments synthesized at once within one job
    #[serde(default = "default_concurrency")]
    pub synthesis_concurrency: usize,

    /// Attempts per segment when the engine reports a transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Upper bound on one HTTP conversion
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub provider: ProviderConfig,
}

fn default_chunk_limit() -> usize {
    DEFAULT_CHUNK_LIMIT
}

fn default_language() -> String {
    "en".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_concurrency() -> usize {
    1
}

fn default_max_retries() -> u32 {
    2
}

fn default_request_timeout() -> u64 {
    600
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for NarrateConfig {
    fn default() -> Self {
        Self {
            chunk_limit: default_chunk_limit(),
            language: default_language(),
            voice: None,
            output_dir: default_output_dir(),
            scratch_dir: None,
            synthesis_concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout(),
            bind_addr: default_bind_addr(),
            provider: ProviderConfig::default(),
        }
    }
}

impl NarrateConfig {
    /// Get the config file path: ~/.config/cli-programs/narrate.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("cli-programs").join("narrate.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: NarrateConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Scratch directory for transient segment files.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("narrate"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions::new()
            .with_language(self.language.clone())
            .with_voice(self.voice.clone())
            .with_max_retries(self.max_retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = NarrateConfig::default();
        assert_eq!(config.chunk_limit, 250);
        assert_eq!(config.language, "en");
        assert!(config.voice.is_none());
        assert_eq!(config.output_dir, PathBuf::from("static"));
        assert_eq!(config.synthesis_concurrency, 1);
        assert_eq!(config.request_timeout(), Duration::from_secs(600));
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.provider.kind, "command");
    }

    #[test]
    fn test_config_path() {
        let path = NarrateConfig::config_path();
        assert!(path.is_ok());
        assert!(path.unwrap().ends_with("cli-programs/narrate.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
chunk_limit = 400
language = "de"
voice = "de+f3"
output_dir = "/srv/audio"
synthesis_concurrency = 4

[provider]
kind = "openai-compatible"
base_url = "http://localhost:8880/v1"
model = "kokoro"
"#;
        let config: NarrateConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chunk_limit, 400);
        assert_eq!(config.language, "de");
        assert_eq!(config.voice.as_deref(), Some("de+f3"));
        assert_eq!(config.output_dir, PathBuf::from("/srv/audio"));
        assert_eq!(config.synthesis_concurrency, 4);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.provider.kind, "openai-compatible");
        assert_eq!(config.provider.model.as_deref(), Some("kokoro"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: NarrateConfig = toml::from_str("").unwrap();
        assert_eq!(config.chunk_limit, 250);
        assert_eq!(config.language, "en");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("narrate.toml");

        let mut config = NarrateConfig::default();
        config.language = "fr".to_string();
        config.scratch_dir = Some(dir.path().join("scratch"));
        config.save_to(&path).unwrap();

        let loaded = NarrateConfig::load_from(&path).unwrap();
        assert_eq!(loaded.language, "fr");
        assert_eq!(loaded.scratch_dir(), dir.path().join("scratch"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = NarrateConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.chunk_limit, 250);
    }

    #[test]
    fn test_synthesis_options_from_config() {
        let mut config = NarrateConfig::default();
        config.voice = Some("en-us".into());
        config.max_retries = 5;
        let opts = config.synthesis_options();
        assert_eq!(opts.voice.as_deref(), Some("en-us"));
        assert_eq!(opts.max_retries, 5);
    }
}
