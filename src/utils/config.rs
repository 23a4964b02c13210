//! TOML-based configuration for tiny-research
//!
//! Configuration is read from a TOML file (`research.toml` by default).
//! Secrets are never written into the file: the file names the environment
//! variable holding each secret (`api_key_env`, `tavily_api_key_env`), and a
//! `.env` file in the working directory is loaded before lookups.
//!
//! When no file exists, [`ResearchConfig::from_env`] builds the defaults and
//! applies the `LLM_MODEL` / `LLM_BASE_URL` overrides.

use crate::types::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from research.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub code: CodeConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub prompts: PromptsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat completions API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable containing the API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_api_key_env() -> String {
    "LLM_TOKEN".to_string()
}

fn default_llm_timeout() -> u64 {
    180
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_llm_api_key_env(),
            temperature: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable.
    ///
    /// A missing key resolves to an empty string; local OpenAI-compatible
    /// servers usually accept unauthenticated requests.
    pub fn api_key(&self) -> String {
        env::var(&self.api_key_env).unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============= Capability Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Environment variable containing the Tavily API key. Without a key
    /// the DuckDuckGo backend is used.
    #[serde(default = "default_tavily_env")]
    pub tavily_api_key_env: String,

    #[serde(default = "default_tavily_url")]
    pub tavily_url: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_tavily_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_tavily_url() -> String {
    "https://api.tavily.com/search".to_string()
}

fn default_max_results() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key_env: default_tavily_env(),
            tavily_url: default_tavily_url(),
            max_results: default_max_results(),
        }
    }
}

impl SearchConfig {
    pub fn tavily_api_key(&self) -> Option<String> {
        env::var(&self.tavily_api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Reader proxy that converts a page to markdown; the target URL is appended.
    #[serde(default = "default_reader_url")]
    pub reader_url: String,
}

fn default_reader_url() -> String {
    "https://r.jina.ai/".to_string()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            reader_url: default_reader_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeConfig {
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
}

fn default_python_bin() -> String {
    "python3".to_string()
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            python_bin: default_python_bin(),
        }
    }
}

// ============= Workflow Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Locale passed to every instruction template
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Planner invocations allowed before falling through to the reporter
    #[serde(default = "default_max_plan_iterations")]
    pub max_plan_iterations: usize,

    /// Maximum number of steps kept from a plan
    #[serde(default = "default_max_step_num")]
    pub max_step_num: usize,

    /// Attempts made by structured generation before giving up
    #[serde(default = "default_structured_max_attempts")]
    pub structured_max_attempts: usize,

    /// Model round-trips allowed inside one tool-calling loop
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,

    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    /// Feed capability failures back to the model instead of aborting the run
    #[serde(default)]
    pub recover_tool_errors: bool,
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_max_plan_iterations() -> usize {
    3
}

fn default_max_step_num() -> usize {
    3
}

fn default_structured_max_attempts() -> usize {
    3
}

fn default_max_tool_iterations() -> usize {
    20
}

fn default_tool_timeout() -> u64 {
    60
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            max_plan_iterations: default_max_plan_iterations(),
            max_step_num: default_max_step_num(),
            structured_max_attempts: default_structured_max_attempts(),
            max_tool_iterations: default_max_tool_iterations(),
            tool_timeout_secs: default_tool_timeout(),
            recover_tool_errors: false,
        }
    }
}

impl WorkflowConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

// ============= Prompt & Logging Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Directory of `<template>.md` files overriding the built-in templates
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl ResearchConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::dotenv().ok();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ResearchConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to [`ResearchConfig::from_env`].
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(missing)) => {
                tracing::info!(
                    "No configuration file at {}, using defaults",
                    missing.display()
                );
                Self::from_env()
            }
            other => other,
        }
    }

    /// Defaults with `LLM_MODEL` and `LLM_BASE_URL` environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = ResearchConfig::default();
        if let Ok(model) = env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(base_url) = env::var("LLM_BASE_URL") {
            config.llm.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model must not be empty".to_string(),
            ));
        }
        if !self.llm.base_url.starts_with("http://") && !self.llm.base_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(format!(
                "llm.base_url must be an http(s) URL, got '{}'",
                self.llm.base_url
            )));
        }
        if self.workflow.structured_max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.structured_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.workflow.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.max_tool_iterations must be at least 1".to_string(),
            ));
        }
        if self.workflow.max_step_num == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.max_step_num must be at least 1".to_string(),
            ));
        }
        if let Some(dir) = &self.prompts.dir {
            if !dir.is_dir() {
                return Err(ConfigError::ValidationError(format!(
                    "prompts.dir does not exist: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
