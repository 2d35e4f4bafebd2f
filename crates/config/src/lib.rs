//! Configuration loading, validation, and management for Parlor.
//!
//! Loads configuration from `~/.parlor/config.toml` with environment
//! variable overrides. Validates all settings at startup, and
//! [`AppConfig::require_credentials`] refuses to serve without the
//! external credentials the service needs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.parlor/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Text-generation provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Conversation store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Identity verification configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Chat behaviour
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins allowed to call the API. Empty = any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Serve the embedded chat page at `/`
    #[serde(default = "default_true")]
    pub serve_frontend: bool,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: vec![],
            serve_frontend: true,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "gemini" or "openai" (any OpenAI-compatible endpoint)
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_kind() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            api_key: None,
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Local endpoints (Ollama, vLLM on localhost) run without a key.
    pub fn is_local(&self) -> bool {
        self.api_url
            .as_deref()
            .is_some_and(|url| url.contains("localhost") || url.contains("127.0.0.1"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database file. Defaults to `~/.parlor/parlor.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// "jwt" or "static"
    #[serde(default = "default_auth_mode")]
    pub mode: String,

    /// HS256 shared secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,

    /// Path to an RS256 public key in PEM format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_pem: Option<String>,

    /// Expected `iss` claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Expected `aud` claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,

    /// Static token → user id table (mode = "static")
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tokens: HashMap<String, String>,
}

fn default_auth_mode() -> String {
    "jwt".into()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: default_auth_mode(),
            jwt_secret: None,
            public_key_pem: None,
            issuer: None,
            audience: None,
            tokens: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("public_key_pem", &self.public_key_pem)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("tokens", &format_args!("[{} REDACTED]", self.tokens.len()))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum conversations returned by the recent-chats listing
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Generate a title after the first turn
    #[serde(default = "default_true")]
    pub auto_title: bool,
}

fn default_recent_limit() -> usize {
    20
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            auto_title: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.parlor/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `PARLOR_API_KEY`, then `GOOGLE_API_KEY` / `OPENAI_API_KEY` for the provider key
    /// - `PARLOR_MODEL`, `PARLOR_PORT`, `PARLOR_DB_PATH`, `PARLOR_JWT_SECRET`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_overrides<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = get("PARLOR_API_KEY") {
            self.provider.api_key = Some(key);
        } else if self.provider.api_key.is_none() {
            let fallback = match self.provider.kind.as_str() {
                "openai" => "OPENAI_API_KEY",
                _ => "GOOGLE_API_KEY",
            };
            self.provider.api_key = get(fallback);
        }

        if let Some(model) = get("PARLOR_MODEL") {
            self.provider.model = model;
        }

        if let Some(port) = get("PARLOR_PORT").and_then(|p| p.parse().ok()) {
            self.gateway.port = port;
        }

        if let Some(path) = get("PARLOR_DB_PATH") {
            self.store.path = Some(path);
        }

        if let Some(secret) = get("PARLOR_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parlor")
    }

    /// The SQLite database file in effect.
    pub fn database_path(&self) -> PathBuf {
        self.store
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("parlor.db"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !matches!(self.provider.kind.as_str(), "gemini" | "openai") {
            return Err(ConfigError::ValidationError(format!(
                "provider.kind must be \"gemini\" or \"openai\", got \"{}\"",
                self.provider.kind
            )));
        }

        if !matches!(self.store.backend.as_str(), "sqlite" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "store.backend must be \"sqlite\" or \"memory\", got \"{}\"",
                self.store.backend
            )));
        }

        if !matches!(self.auth.mode.as_str(), "jwt" | "static") {
            return Err(ConfigError::ValidationError(format!(
                "auth.mode must be \"jwt\" or \"static\", got \"{}\"",
                self.auth.mode
            )));
        }

        if !(1..=100).contains(&self.chat.recent_limit) {
            return Err(ConfigError::ValidationError(
                "chat.recent_limit must be between 1 and 100".into(),
            ));
        }

        Ok(())
    }

    /// Fail fast when the external credentials the service needs are missing.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let has_key = self
            .provider
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key && !self.provider.is_local() {
            return Err(ConfigError::MissingCredential(
                "provider API key (set provider.api_key, PARLOR_API_KEY or GOOGLE_API_KEY)".into(),
            ));
        }

        match self.auth.mode.as_str() {
            "static" if self.auth.tokens.is_empty() => Err(ConfigError::MissingCredential(
                "auth.tokens must list at least one token in static mode".into(),
            )),
            "jwt" if self.auth.jwt_secret.is_none() && self.auth.public_key_pem.is_none() => {
                Err(ConfigError::MissingCredential(
                    "auth.jwt_secret or auth.public_key_pem is required in jwt mode".into(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}
