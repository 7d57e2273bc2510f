//! Configuration for spam-guard
//!
//! Values come from an optional TOML file, then from `SPAM_GUARD_*`
//! environment variables. Nested keys use a double underscore, lists are
//! comma-separated:
//!
//! ```text
//! SPAM_GUARD_DRY_RUN=true
//! SPAM_GUARD_AI__PROVIDER=openai
//! SPAM_GUARD_CUSTOM_KEYWORDS=free followers,promo code
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GuardError, Result};
use crate::llm::{gemini, openai, ProviderPreference};
use crate::security::rate_limit::{DEFAULT_MAX_CALLS, DEFAULT_WINDOW};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SPAM_GUARD";

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuardConfig {
    /// Operator switch for the AI layer
    #[serde(default = "default_true")]
    pub use_ai: bool,
    /// Compute deletions without executing them
    #[serde(default)]
    pub dry_run: bool,
    /// Channel ids to moderate (empty = all)
    #[serde(default)]
    pub monitored_channels: Vec<String>,
    /// Operator keyword blocklist, in priority order
    #[serde(default)]
    pub custom_keywords: Vec<String>,
    /// Replacement pattern table (TOML)
    #[serde(default)]
    pub patterns_file: Option<PathBuf>,
    /// AI classifier configuration
    #[serde(default)]
    pub ai: AiConfig,
    /// AI call budget
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// AI classifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    /// Which backend to use
    #[serde(default)]
    pub provider: ProviderPreference,
    /// Per-call timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    /// Minimum confidence for an AI spam verdict
    #[serde(default = "default_min_confidence")]
    pub min_confidence: u8,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default)]
    pub gemini_base_url: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// OpenAI-compatible endpoint override
    #[serde(default)]
    pub openai_base_url: Option<String>,
}

/// AI call budget
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_checks")]
    pub max_checks_per_window: u32,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

fn default_true() -> bool {
    true
}

fn default_ai_timeout() -> u64 {
    15
}

fn default_min_confidence() -> u8 {
    70
}

fn default_gemini_model() -> String {
    gemini::DEFAULT_MODEL.to_string()
}

fn default_openai_model() -> String {
    openai::DEFAULT_MODEL.to_string()
}

fn default_max_checks() -> u32 {
    DEFAULT_MAX_CALLS
}

fn default_window_ms() -> u64 {
    DEFAULT_WINDOW.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderPreference::default(),
            timeout_secs: default_ai_timeout(),
            min_confidence: default_min_confidence(),
            gemini_model: default_gemini_model(),
            gemini_base_url: None,
            openai_model: default_openai_model(),
            openai_base_url: None,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_checks_per_window: default_max_checks(),
            window_ms: default_window_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            use_ai: true,
            dry_run: false,
            monitored_channels: Vec::new(),
            custom_keywords: Vec::new(),
            patterns_file: None,
            ai: AiConfig::default(),
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GuardConfig {
    /// Load from an optional TOML file plus `SPAM_GUARD_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load with a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(GuardError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("custom_keywords")
                .with_list_parse_key("monitored_channels"),
        );

        let config: GuardConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GuardConfig = toml::from_str(content)
            .map_err(|e| GuardError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable a component silently
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.max_checks_per_window == 0 {
            return Err(GuardError::Config(
                "rate_limit.max_checks_per_window must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(GuardError::Config(
                "rate_limit.window_ms must be at least 1".to_string(),
            ));
        }
        if self.ai.timeout_secs == 0 {
            return Err(GuardError::Config(
                "ai.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.ai.min_confidence > 100 {
            return Err(GuardError::Config(format!(
                "ai.min_confidence must be within 0..=100, got {}",
                self.ai.min_confidence
            )));
        }
        Ok(())
    }

    /// Is this channel moderated
    pub fn is_monitored(&self, channel_id: &str) -> bool {
        self.monitored_channels.is_empty()
            || self.monitored_channels.iter().any(|c| c == channel_id)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GuardError::Config(format!("Failed to render config: {}", e)))
    }
}
