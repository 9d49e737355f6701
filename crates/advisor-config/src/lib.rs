//! Multi-tier TOML configuration for Advisor.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > global config file > defaults

use advisor_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default OpenAI-compatible API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com";

/// The default model to use.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// The default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The default max tokens for a response.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Pause before each completion call, in milliseconds.
pub const DEFAULT_PRE_CALL_DELAY_MS: u64 = 1000;

/// Resolved configuration for an Advisor session.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,
    pub pre_call_delay_ms: u64,
    pub max_chunk_words: usize,
    pub max_selected_chunks: usize,
    pub persona: Option<String>,
    pub tesseract_path: PathBuf,
    pub ocr_languages: Vec<String>,
    pub session_path: PathBuf,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub ocr: OcrSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_retries: Option<u32>,
    pub pre_call_delay_ms: Option<u64>,
}

/// How uploaded text is cut up and filtered before it reaches the prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextSettings {
    pub max_chunk_words: Option<usize>,
    pub max_selected_chunks: Option<usize>,
    pub persona: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrSettings {
    pub tesseract_path: Option<PathBuf>,
    pub languages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    pub path: Option<PathBuf>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub session_path: Option<PathBuf>,
}

impl AdvisorConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Global config (~/.advisor/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));
        resolve(overrides, settings, config_dir, |key| std::env::var(key).ok())
    }
}

/// Merge the tiers. `env` looks up environment variables.
fn resolve(
    overrides: CliOverrides,
    settings: SettingsFile,
    config_dir: PathBuf,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AdvisorConfig, ConfigError> {
    // Resolve API key: CLI > env > config file. A blank tier falls through.
    let nonblank = |key: &String| !key.trim().is_empty();
    let api_key = overrides
        .api_key
        .filter(nonblank)
        .or_else(|| env("OPENAI_API_KEY").filter(nonblank))
        .or(settings.api.api_key.filter(nonblank))
        .ok_or_else(|| ConfigError::MissingKey {
            key: "api_key (set OPENAI_API_KEY or add to ~/.advisor/config.toml)".into(),
        })?;

    let model = overrides
        .model
        .or_else(|| env("ADVISOR_MODEL"))
        .or(settings.api.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let api_base_url = env("OPENAI_BASE_URL")
        .or(settings.api.base_url)
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    let temperature = overrides
        .temperature
        .or(settings.api.temperature)
        .unwrap_or(DEFAULT_TEMPERATURE);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::InvalidValue {
            key: "api.temperature".into(),
            message: format!("{temperature} is outside 0.0..=2.0"),
        });
    }

    let max_tokens = overrides
        .max_tokens
        .or(settings.api.max_tokens)
        .unwrap_or(DEFAULT_MAX_TOKENS);

    let max_chunk_words = settings
        .context
        .max_chunk_words
        .unwrap_or(advisor_docs::DEFAULT_MAX_WORDS);
    if max_chunk_words == 0 {
        return Err(ConfigError::InvalidValue {
            key: "context.max_chunk_words".into(),
            message: "must be at least 1".into(),
        });
    }

    let session_path = overrides
        .session_path
        .or(settings.session.path)
        .unwrap_or_else(|| PathBuf::from(advisor_session::DEFAULT_SESSION_FILE));

    Ok(AdvisorConfig {
        api_key,
        model,
        api_base_url,
        temperature,
        max_tokens,
        max_retries: settings.api.max_retries.unwrap_or(0),
        pre_call_delay_ms: settings
            .api
            .pre_call_delay_ms
            .unwrap_or(DEFAULT_PRE_CALL_DELAY_MS),
        max_chunk_words,
        max_selected_chunks: settings
            .context
            .max_selected_chunks
            .unwrap_or(advisor_docs::DEFAULT_MAX_CHUNKS),
        persona: settings.context.persona,
        tesseract_path: settings
            .ocr
            .tesseract_path
            .unwrap_or_else(|| PathBuf::from("tesseract")),
        ocr_languages: settings.ocr.languages.unwrap_or_else(|| {
            advisor_docs::DEFAULT_LANGUAGES
                .iter()
                .map(|l| l.to_string())
                .collect()
        }),
        session_path,
        config_dir,
    })
}

/// Get the Advisor config directory path (~/.advisor/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ADVISOR_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".advisor")
}

/// Parse TOML settings, reporting where the bad file lives.
pub fn parse_settings(content: &str, path: &Path) -> Result<SettingsFile, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_settings(&content, path).unwrap_or_else(|e| {
            tracing::warn!("{e}");
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
