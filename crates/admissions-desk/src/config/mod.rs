use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::theme::Theme;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8002";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Distinguishes runtime behavior for different stages of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the admissions desk.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub telemetry: TelemetryConfig,
    pub theme: Theme,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let base_url = parse_base_url(
            &env::var("APP_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        )?;

        let admin_key = env::var("APP_ADMIN_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let timeout_secs = match env::var("APP_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        let theme = Theme::from_str(&env::var("APP_THEME").unwrap_or_default());

        Ok(Self {
            environment,
            api: ApiConfig {
                base_url,
                admin_key,
                timeout: Duration::from_secs(timeout_secs),
            },
            telemetry: TelemetryConfig { log_level },
            theme,
        })
    }
}

/// Settings for reaching the admissions API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub admin_key: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: as_base(base_url),
            admin_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn set_base_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(())
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl { source })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase);
    }
    Ok(as_base(url))
}

/// Give the URL a trailing `/` so relative joins append to its path prefix
/// instead of replacing the last segment.
pub fn as_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBaseUrl { source: url::ParseError },
    NotABase,
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBaseUrl { .. } => {
                write!(f, "APP_API_BASE must be an absolute http(s) URL")
            }
            ConfigError::NotABase => write!(f, "APP_API_BASE cannot be used as a base URL"),
            ConfigError::InvalidTimeout => {
                write!(f, "APP_HTTP_TIMEOUT_SECS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidBaseUrl { source } => Some(source),
            ConfigError::NotABase | ConfigError::InvalidTimeout => None,
        }
    }
}
