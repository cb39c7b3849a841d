//! Match configuration loaded from TOML.

use crate::llm_client::LlmProvider;
use crate::providers::default_description;
use crate::retry::RetryPolicy;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use duel_tictactoe::Mark;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Where a party's moves come from, parsed from `"provider:model"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSpec {
    /// A hosted chat model.
    Llm {
        /// Hosting provider.
        provider: LlmProvider,
        /// Provider-specific model id.
        model: String,
    },
    /// The built-in first-free-cell player.
    Local,
}

impl FromStr for ModelSpec {
    type Err = ConfigError;

    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model) = s.split_once(':').ok_or_else(|| {
            ConfigError::new(format!(
                "Model must be written as provider:model, got {:?}",
                s
            ))
        })?;

        if provider == "local" {
            return Ok(ModelSpec::Local);
        }

        let provider = LlmProvider::from_str(provider)
            .map_err(|_| ConfigError::new(format!("Unsupported model provider: {}", provider)))?;

        if model.is_empty() {
            return Err(ConfigError::new(format!("Missing model name in {:?}", s)));
        }

        Ok(ModelSpec::Llm {
            provider,
            model: model.to_string(),
        })
    }
}

/// Configuration for one party.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_", into)]
pub struct PartyConfig {
    /// Display name, recorded on every move the party makes.
    name: String,

    /// Move source as `provider:model` (e.g. `groq:llama-3.3-70b-versatile`).
    model: String,

    /// System prompt override; the built-in prompt for the party's mark is
    /// used when absent.
    #[serde(default)]
    description: Option<String>,

    /// Solicitations per turn before the game is aborted.
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,

    /// Pause between solicitations, in seconds.
    #[serde(default = "default_delay_secs")]
    delay_between_attempts_secs: u64,

    /// Timeout for a single provider call, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    call_timeout_secs: u64,

    /// Maximum tokens for LLM responses.
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
}

fn default_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_delay_secs() -> u64 {
    RetryPolicy::DEFAULT_DELAY.as_secs()
}

fn default_call_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    150
}

impl PartyConfig {
    /// Creates a party with default retry and timeout settings.
    #[instrument(skip(name, model))]
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            description: None,
            max_attempts: default_max_attempts(),
            delay_between_attempts_secs: default_delay_secs(),
            call_timeout_secs: default_call_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }

    /// Parses the `model` field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the provider prefix is unsupported.
    pub fn model_spec(&self) -> Result<ModelSpec, ConfigError> {
        self.model.parse()
    }

    /// Retry policy built from this party's settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_secs(self.delay_between_attempts_secs),
        )
    }

    /// Timeout for a single provider call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// System prompt for this party playing `mark`.
    pub fn system_prompt(&self, mark: Mark) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| default_description(mark))
    }
}

/// Configuration for a whole match.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_", into)]
pub struct DuelConfig {
    /// Party playing X (moves first).
    #[serde(default = "default_player_x")]
    player_x: PartyConfig,

    /// Party playing O.
    #[serde(default = "default_player_o")]
    player_o: PartyConfig,

    /// Log every attempt, not only failures and applied moves.
    #[serde(default = "default_debug_mode")]
    debug_mode: bool,

    /// Hard ceiling on one turn's wall time, in seconds.
    #[serde(default)]
    per_turn_timeout_secs: Option<u64>,
}

fn default_player_x() -> PartyConfig {
    PartyConfig::new("Player X", "groq:llama-3.3-70b-versatile")
}

fn default_player_o() -> PartyConfig {
    PartyConfig::new("Player O", "groq:deepseek-r1-distill-llama-70b")
}

fn default_debug_mode() -> bool {
    true
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            player_x: default_player_x(),
            player_o: default_player_o(),
            debug_mode: default_debug_mode(),
            per_turn_timeout_secs: None,
        }
    }
}

impl DuelConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(
            player_x = %config.player_x.name,
            player_o = %config.player_o.name,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Parses and checks configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.player_x.model_spec()?;
        config.player_o.model_spec()?;
        Ok(config)
    }

    /// The party configured for `mark`.
    pub fn party(&self, mark: Mark) -> &PartyConfig {
        match mark {
            Mark::X => &self.player_x,
            Mark::O => &self.player_o,
        }
    }

    /// Per-turn ceiling, if configured.
    pub fn per_turn_timeout(&self) -> Option<Duration> {
        self.per_turn_timeout_secs.map(Duration::from_secs)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_spec_parses_llm() {
        assert_eq!(
            "groq:llama-3.3-70b-versatile".parse::<ModelSpec>().unwrap(),
            ModelSpec::Llm {
                provider: LlmProvider::Groq,
                model: "llama-3.3-70b-versatile".to_string(),
            }
        );
    }

    #[test]
    fn test_model_spec_keeps_colons_in_model_name() {
        let spec: ModelSpec = "openai:ft:gpt-4o-mini:org".parse().unwrap();
        assert_eq!(
            spec,
            ModelSpec::Llm {
                provider: LlmProvider::OpenAI,
                model: "ft:gpt-4o-mini:org".to_string(),
            }
        );
    }

    #[test]
    fn test_model_spec_local() {
        assert_eq!("local:first-free".parse::<ModelSpec>().unwrap(), ModelSpec::Local);
    }

    #[test]
    fn test_model_spec_rejects_unknown_provider() {
        let err = "mistral:large".parse::<ModelSpec>().unwrap_err();
        assert!(err.message.contains("Unsupported model provider: mistral"));
    }

    #[test]
    fn test_model_spec_rejects_missing_separator() {
        assert!("llama".parse::<ModelSpec>().is_err());
        assert!("groq:".parse::<ModelSpec>().is_err());
    }

    #[test]
    fn test_defaults_match_reference_setup() {
        let config = DuelConfig::default();
        assert!(*config.debug_mode());
        assert_eq!(config.player_x().model(), "groq:llama-3.3-70b-versatile");
        assert_eq!(config.player_o().model(), "groq:deepseek-r1-distill-llama-70b");
        assert_eq!(config.party(Mark::O).retry_policy(), RetryPolicy::default());
        assert_eq!(config.per_turn_timeout(), None);
    }

    #[test]
    fn test_system_prompt_override() {
        let party = PartyConfig::new("X", "local:any");
        assert!(party.system_prompt(Mark::X).contains("Player X"));

        let party = party.with_description("Play the center.".to_string());
        assert_eq!(party.system_prompt(Mark::X), "Play the center.");
    }

    #[test]
    fn test_from_toml_applies_field_defaults() {
        let config = DuelConfig::from_toml(
            r#"
            debug_mode = false
            per_turn_timeout_secs = 90

            [player_x]
            name = "Alice"
            model = "anthropic:claude-3-5-haiku-20241022"
            max_attempts = 5

            [player_o]
            name = "Bob"
            model = "local:first-free"
            "#,
        )
        .unwrap();

        assert!(!*config.debug_mode());
        assert_eq!(config.per_turn_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(*config.player_x().max_attempts(), 5);
        assert_eq!(*config.player_x().delay_between_attempts_secs(), 30);
        assert_eq!(config.player_o().call_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_from_toml_rejects_unsupported_provider() {
        let err = DuelConfig::from_toml(
            r#"
            [player_x]
            name = "Alice"
            model = "cohere:command"
            "#,
        )
        .unwrap_err();
        assert!(err.message.contains("Unsupported model provider"));
    }
}
