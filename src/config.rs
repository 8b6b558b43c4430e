use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Connection settings handed to a source adapter at construction time.
///
/// Credentials are opaque to the core; adapters only forward them as bearer
/// tokens on outbound requests.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// Base URL of the provider endpoint.
    pub base_url: String,
    /// API key or token presented to the provider.
    pub api_key: String,
    /// Per-call timeout applied to the adapter's HTTP client, in seconds.
    pub timeout_secs: u64,
}

/// Settings for the AI completion gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionSettings {
    /// Base URL of the completion service.
    pub base_url: String,
    /// API key presented to the completion service.
    pub api_key: String,
    /// Model identifier passed with every completion request.
    pub model: String,
    /// Token budget requested for generated responses.
    pub max_tokens: u32,
    /// Timeout applied to the gateway's HTTP client, in seconds.
    pub timeout_secs: u64,
}

/// Runtime configuration for the docbridge server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Notion block-tree source settings.
    pub notion: SourceSettings,
    /// Google Docs source settings.
    pub google_docs: SourceSettings,
    /// Google Sheets source settings.
    pub google_sheets: SourceSettings,
    /// Remote document store ("google-drive") settings.
    pub google_drive: SourceSettings,
    /// Completion gateway settings.
    pub completion: CompletionSettings,
    /// Per-call fetch timeout enforced by the batch orchestrator, in seconds.
    pub fetch_timeout_secs: u64,
    /// Whole-batch deadline, in seconds.
    pub batch_timeout_secs: u64,
    /// Maximum number of concurrent outbound fetches per batch.
    pub fetch_concurrency: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

const DEFAULT_NOTION_URL: &str = "https://api.notion.com";
const DEFAULT_DOCS_URL: &str = "https://docs.googleapis.com";
const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 120;
const DEFAULT_FETCH_CONCURRENCY: usize = 4;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let fetch_timeout_secs = parse_env_or("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;
        let google_token = load_env("GOOGLE_API_TOKEN")?;

        Ok(Self {
            notion: SourceSettings {
                base_url: load_env_or("NOTION_BASE_URL", DEFAULT_NOTION_URL),
                api_key: load_env("NOTION_API_KEY")?,
                timeout_secs: fetch_timeout_secs,
            },
            google_docs: SourceSettings {
                base_url: load_env_or("GOOGLE_DOCS_BASE_URL", DEFAULT_DOCS_URL),
                api_key: google_token.clone(),
                timeout_secs: fetch_timeout_secs,
            },
            google_sheets: SourceSettings {
                base_url: load_env_or("GOOGLE_SHEETS_BASE_URL", DEFAULT_SHEETS_URL),
                api_key: google_token,
                timeout_secs: fetch_timeout_secs,
            },
            google_drive: SourceSettings {
                base_url: load_env("GOOGLE_DRIVE_BASE_URL")?,
                api_key: load_env("GOOGLE_DRIVE_API_KEY")?,
                timeout_secs: fetch_timeout_secs,
            },
            completion: CompletionSettings {
                base_url: load_env("COMPLETION_BASE_URL")?,
                api_key: load_env("COMPLETION_API_KEY")?,
                model: load_env_or("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
                max_tokens: parse_env_or("COMPLETION_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
                timeout_secs: fetch_timeout_secs,
            },
            fetch_timeout_secs,
            batch_timeout_secs: parse_env_or("BATCH_TIMEOUT_SECS", DEFAULT_BATCH_TIMEOUT_SECS)?,
            fetch_concurrency: parse_env_or("FETCH_CONCURRENCY", DEFAULT_FETCH_CONCURRENCY)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }

    /// Load `.env` (when present) and build the configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        tracing::debug!(
            notion_url = %config.notion.base_url,
            drive_url = %config.google_drive.base_url,
            completion_url = %config.completion.base_url,
            fetch_timeout_secs = config.fetch_timeout_secs,
            batch_timeout_secs = config.batch_timeout_secs,
            fetch_concurrency = config.fetch_concurrency,
            server_port = ?config.server_port,
            "Loaded configuration"
        );
        Ok(config)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
        .map(|value| value.unwrap_or(default))
}
