//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use vocalis_grading::GeminiConfig;
use vocalis_voice::PollyConfig;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Token signing and password hashing.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Answer grading.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Speech synthesis.
    #[serde(default)]
    pub polly: PollyConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "vocalis_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Access token and password settings.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret. Required.
    #[serde(default)]
    pub jwt_secret: String,

    /// `HS256`, `HS384` or `HS512`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: u64,

    /// bcrypt work factor for new passwords.
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
}

/// Cross-origin settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Exact origins allowed to call the API. `"*"` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> String {
    "vocalis.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> u64 {
    30
}

/// Ten years.
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: u64 = 10 * 365 * 24 * 60;

fn default_password_cost() -> u32 {
    vocalis_identity::DEFAULT_COST
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "https://daw-frontend.vercel.app".to_string(),
        "https://vercel.live".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            algorithm: default_algorithm(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
            password_cost: default_password_cost(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("password_cost", &self.password_cost)
            .finish()
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is present but unusable.
    #[error("invalid configuration for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Config {
    /// Checks the settings the server cannot start without.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] for an empty JWT secret, a non-HMAC
    /// algorithm, a token lifetime outside 1 minute to ten years, or an
    /// out-of-range bcrypt cost.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "auth.jwt_secret",
                reason: "must be set (or provide VOCALIS_JWT_SECRET)".to_string(),
            });
        }
        if !matches!(
            self.auth.algorithm.trim(),
            "HS256" | "HS384" | "HS512"
        ) {
            return Err(ConfigError::Invalid {
                field: "auth.algorithm",
                reason: format!("expected HS256, HS384 or HS512, got {:?}", self.auth.algorithm),
            });
        }
        let minutes = self.auth.access_token_expire_minutes;
        if !(1..=MAX_ACCESS_TOKEN_EXPIRE_MINUTES).contains(&minutes) {
            return Err(ConfigError::Invalid {
                field: "auth.access_token_expire_minutes",
                reason: format!("must be between 1 and {MAX_ACCESS_TOKEN_EXPIRE_MINUTES}"),
            });
        }
        if !(vocalis_identity::MIN_COST..=31).contains(&self.auth.password_cost) {
            return Err(ConfigError::Invalid {
                field: "auth.password_cost",
                reason: format!(
                    "must be between {} and 31",
                    vocalis_identity::MIN_COST
                ),
            });
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// validates it.
///
/// Environment variable overrides:
/// - `VOCALIS_HOST`, `VOCALIS_PORT` override `server.*`
/// - `VOCALIS_DB_PATH` overrides `database.path`
/// - `VOCALIS_LOG_LEVEL` overrides `logging.level`
/// - `VOCALIS_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `VOCALIS_JWT_SECRET`, `VOCALIS_JWT_ALGORITHM`,
///   `VOCALIS_ACCESS_TOKEN_EXPIRE_MINUTES` override `auth.*`
/// - `VOCALIS_GEMINI_API_KEY`, `VOCALIS_GEMINI_MODEL` override `gemini.*`
/// - `VOCALIS_POLLY_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
///   `AWS_SESSION_TOKEN` override `polly.*`
/// - `VOCALIS_CORS_ORIGINS` (comma-separated) overrides `cors.allowed_origins`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if the result fails [`Config::validate`].
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

/// Applies overrides read through `var`, so tests need not touch the
/// process environment.
pub fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("VOCALIS_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("VOCALIS_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = var("VOCALIS_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("VOCALIS_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("VOCALIS_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Some(secret) = var("VOCALIS_JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(algorithm) = var("VOCALIS_JWT_ALGORITHM") {
        config.auth.algorithm = algorithm;
    }
    if let Some(minutes) = var("VOCALIS_ACCESS_TOKEN_EXPIRE_MINUTES") {
        if let Ok(parsed) = minutes.parse() {
            config.auth.access_token_expire_minutes = parsed;
        }
    }

    if let Some(key) = var("VOCALIS_GEMINI_API_KEY") {
        config.gemini.api_key = key;
    }
    if let Some(model) = var("VOCALIS_GEMINI_MODEL") {
        config.gemini.model = model;
    }

    if let Some(region) = var("VOCALIS_POLLY_REGION") {
        config.polly.region = region;
    }
    if let Some(id) = var("AWS_ACCESS_KEY_ID") {
        config.polly.access_key_id = id;
    }
    if let Some(secret) = var("AWS_SECRET_ACCESS_KEY") {
        config.polly.secret_access_key = secret;
    }
    if let Some(token) = var("AWS_SESSION_TOKEN") {
        config.polly.session_token = Some(token).filter(|t| !t.is_empty());
    }

    if let Some(origins) = var("VOCALIS_CORS_ORIGINS") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }
}
