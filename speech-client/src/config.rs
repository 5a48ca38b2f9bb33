use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Speech provider configuration, embedded in the application's config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier (command, openai-compatible)
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Engine executable for the command provider (looked up in PATH if relative)
    #[serde(default = "default_command")]
    pub command: PathBuf,

    /// Engine arguments; `{language}` and `{voice}` are substituted per request
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Base URL for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_kind() -> String {
    "command".to_string()
}

fn default_command() -> PathBuf {
    PathBuf::from("espeak-ng")
}

fn default_args() -> Vec<String> {
    ["-v", "{language}", "--stdin", "--stdout"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            command: default_command(),
            args: default_args(),
            base_url: None,
            model: None,
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.kind, "command");
        assert_eq!(config.command, PathBuf::from("espeak-ng"));
        assert!(config.args.contains(&"{language}".to_string()));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
kind = "openai-compatible"
base_url = "http://localhost:8880/v1"
model = "kokoro"
"#;
        let config: ProviderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.kind, "openai-compatible");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8880/v1"));
        assert_eq!(config.model.as_deref(), Some("kokoro"));
        assert_eq!(config.command, PathBuf::from("espeak-ng"));
    }

    #[test]
    fn test_config_serialization_skips_empty() {
        let config = ProviderConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("api_key"));
        let parsed: ProviderConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.args, config.args);
    }
}
