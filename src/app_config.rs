use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use url::Url;

use crate::marking::SampleLevel;
use crate::rubric::RubricSchema;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Marking (feedback generation) config
    #[serde(default)]
    pub marking: MarkingConfig,

    /// Rubric schema
    #[serde(default)]
    pub rubric: RubricSchema,

    /// Manual scoring settings
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Chat-completion provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    // @provider: OpenAI (or any OpenAI-compatible endpoint)
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl ModelProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    // @returns: Environment variable holding the provider credential
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for ModelProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Completion token cap, provider default when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: ModelProvider) -> Self {
        match provider_type {
            ModelProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                timeout_secs: default_timeout_secs(),
                max_tokens: None,
            },
            ModelProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_timeout_secs(),
                max_tokens: Some(default_anthropic_max_tokens()),
            },
        }
    }
}

/// Marking service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MarkingConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: ModelProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common marking settings
    #[serde(default)]
    pub common: MarkingCommonConfig,
}

/// Common marking settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MarkingCommonConfig {
    /// System role sent with every marking request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Benchmark level the marker calibrates against
    #[serde(default)]
    pub sample_level: SampleLevel,

    /// Temperature parameter for text generation, omitted from requests when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for MarkingCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            sample_level: SampleLevel::default(),
            temperature: None,
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Manual score adjustment settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Score every criterion starts at before manual adjustment
    #[serde(default = "default_score")]
    pub default_score: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_score: default_score(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_score() -> u8 {
    5
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

// Anthropic rejects requests without max_tokens
fn default_anthropic_max_tokens() -> u32 {
    4096
}

fn default_system_prompt() -> String {
    "You are a helpful academic marking assistant.".to_string()
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Fill in the active provider's API key from the environment when the config leaves it empty
    ///
    /// The lookup is passed in so the environment is read exactly once, at startup.
    pub fn apply_env_credentials<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = self.marking.provider.clone();
        let Some(key) = lookup(provider.api_key_env_var()).filter(|k| !k.trim().is_empty()) else {
            return;
        };

        match self.marking.get_active_provider_config_mut() {
            Some(provider_config) => {
                if provider_config.api_key.is_empty() {
                    provider_config.api_key = key;
                }
            }
            None => {
                let mut provider_config = ProviderConfig::new(provider);
                provider_config.api_key = key;
                self.marking.available_providers.push(provider_config);
            }
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.marking.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider (set it in the config or {})",
                self.marking.provider.display_name(),
                self.marking.provider.api_key_env_var()
            ));
        }

        let endpoint = self.marking.get_endpoint();
        Url::parse(&endpoint)
            .with_context(|| format!("Invalid provider endpoint: {}", endpoint))?;

        if self.marking.get_timeout_secs() == 0 {
            return Err(anyhow!("Provider timeout must be greater than zero"));
        }

        if self.scoring.default_score > 10 {
            return Err(anyhow!(
                "Default score {} is out of range (0-10)",
                self.scoring.default_score
            ));
        }

        if self.rubric.criterion_column.trim().is_empty() {
            return Err(anyhow!("Rubric criterion column name cannot be empty"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            marking: MarkingConfig::default(),
            rubric: RubricSchema::default(),
            scoring: ScoringConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl MarkingConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    fn get_active_provider_config_mut(&mut self) -> Option<&mut ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &ModelProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Override the model of the active provider
    pub fn set_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        match self.get_active_provider_config_mut() {
            Some(provider_config) => provider_config.model = model,
            None => {
                let mut provider_config = ProviderConfig::new(self.provider.clone());
                provider_config.model = model;
                self.available_providers.push(provider_config);
            }
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            ModelProvider::OpenAI => default_openai_model(),
            ModelProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            ModelProvider::OpenAI => default_openai_endpoint(),
            ModelProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Get the completion token cap for the active provider
    pub fn get_max_tokens(&self) -> Option<u32> {
        match self.get_active_provider_config() {
            Some(provider_config) => provider_config.max_tokens,
            None if self.provider == ModelProvider::Anthropic => Some(default_anthropic_max_tokens()),
            None => None,
        }
    }
}

impl Default for MarkingConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            available_providers: vec![
                ProviderConfig::new(ModelProvider::OpenAI),
                ProviderConfig::new(ModelProvider::Anthropic),
            ],
            common: MarkingCommonConfig::default(),
        }
    }
}
