//! Speech provider implementations

mod command;
pub mod mock;
mod openai_compatible;

pub use command::CommandProvider;
pub use mock::MockProvider;
pub use openai_compatible::OpenAICompatibleProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, SpeechError};
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Command,
    OpenAICompatible,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "command" | "cli" | "espeak" => Ok(Self::Command),
            "openai-compatible" | "openai_compatible" | "openai" => Ok(Self::OpenAICompatible),
            _ => Err(SpeechError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Canonical name as written in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::OpenAICompatible => "openai-compatible",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::Command => None,
            Self::OpenAICompatible => Some("OPENAI_API_KEY"),
        }
    }
}

/// Create a provider instance from configuration
pub fn get_provider(config: &ProviderConfig) -> Result<Box<dyn SpeechProvider>> {
    let kind = ProviderKind::from_str(&config.kind)?;

    match kind {
        ProviderKind::Command => Ok(Box::new(CommandProvider::new(
            &config.command,
            config.args.clone(),
        )?)),
        ProviderKind::OpenAICompatible => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                SpeechError::ConfigError("base_url is required for openai-compatible".into())
            })?;
            let model = config.model.as_deref().unwrap_or("tts-1");
            let api_key = get_api_key(config, kind, "OpenAI-compatible")?;
            Ok(Box::new(OpenAICompatibleProvider::new(
                model, base_url, api_key,
            )?))
        }
    }
}

/// Get API key from config or the provider's environment variable
fn get_api_key(config: &ProviderConfig, kind: ProviderKind, provider_name: &str) -> Result<String> {
    // Check config first
    if let Some(key) = config.api_key.clone() {
        return Ok(key);
    }

    let env_var = kind.env_var().ok_or_else(|| {
        SpeechError::ConfigError(format!("{} does not take an API key", provider_name))
    })?;
    std::env::var(env_var).map_err(|_| SpeechError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::from_str("command").unwrap(), ProviderKind::Command);
        assert_eq!(
            ProviderKind::from_str("OpenAI-Compatible").unwrap(),
            ProviderKind::OpenAICompatible
        );
        assert!(ProviderKind::from_str("gtts").is_err());
    }

    #[test]
    fn test_provider_kind_canonical_name() {
        for alias in ["cli", "espeak", "openai", "openai_compatible"] {
            let kind = ProviderKind::from_str(alias).unwrap();
            assert_eq!(ProviderKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert_eq!(ProviderKind::from_str("espeak").unwrap().as_str(), "command");
    }

    #[test]
    fn test_env_var_per_kind() {
        assert_eq!(ProviderKind::Command.env_var(), None);
        assert_eq!(
            ProviderKind::OpenAICompatible.env_var(),
            Some("OPENAI_API_KEY")
        );
    }

    #[test]
    fn test_configured_key_wins_over_environment() {
        let config = ProviderConfig {
            api_key: Some("from-config".into()),
            ..ProviderConfig::default()
        };
        let key = get_api_key(&config, ProviderKind::OpenAICompatible, "OpenAI-compatible");
        assert_eq!(key.unwrap(), "from-config");

        let err = get_api_key(&ProviderConfig::default(), ProviderKind::Command, "command");
        assert!(matches!(err, Err(SpeechError::ConfigError(_))));
    }

    #[test]
    fn test_openai_requires_base_url() {
        let config = ProviderConfig {
            kind: "openai-compatible".into(),
            api_key: Some("key".into()),
            ..ProviderConfig::default()
        };
        match get_provider(&config) {
            Err(SpeechError::ConfigError(msg)) => assert!(msg.contains("base_url")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_openai_uses_configured_key() {
        let config = ProviderConfig {
            kind: "openai-compatible".into(),
            base_url: Some("http://localhost:8880/v1/".into()),
            api_key: Some("key".into()),
            ..ProviderConfig::default()
        };
        let provider = get_provider(&config).unwrap();
        assert_eq!(provider.name(), "OpenAI-compatible");
        assert!(provider.is_available().is_ok());
    }
}
