//! # Configuration
//!
//! Settings for the server, logging, and prompt overrides.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config <path>`, else `OCCAM_CONFIG`, else none
//! 3. Environment variables:
//!    - `OCCAM_HOST`, `OCCAM_PORT`
//!    - `OCCAM_RATE_LIMIT` (requests per second, 0 disables)
//!    - `OCCAM_CORS_ORIGINS` (comma-separated, or `*`)
//!    - `OCCAM_LOG_FORMAT` (`text` or `json`)
//!    - `OCCAM_API_KEY` (the only source of the API key; a file entry is
//!      rejected as an unknown field)
//!
//! ## Example
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 9090
//! rate_limit = 50
//! cors_origins = ["http://localhost:3000"]
//!
//! [logging]
//! format = "json"
//!
//! [prompts]
//! implementation_refinement = "Review the diff once more before finishing."
//! ```

use crate::api::ApiKey;
use occam_core::{OccamError, PromptCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "OCCAM_CONFIG";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OCCAM_API_KEY";

/// Default `/step` quota: 100 decisions per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// SETTINGS
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = OccamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(OccamError::Config(format!("unknown log format '{}'", other))),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `POST /step` decisions per second; 0 disables the quota.
    pub rate_limit: u32,
    /// Allowed CORS origins. Empty means localhost only, `["*"]` means any.
    pub cors_origins: Vec<String>,
    /// Required bearer key, from the environment only.
    #[serde(skip)]
    pub api_key: Option<ApiKey>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: Vec::new(),
            api_key: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Guidance text overrides by canonical key.
    pub prompts: BTreeMap<String, String>,
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(document: &str) -> Result<Self, OccamError> {
        toml::from_str(document).map_err(|e| OccamError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, OccamError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OccamError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from the explicit path, `OCCAM_CONFIG`, or
    /// defaults, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, OccamError> {
        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `OCCAM_*` overrides using the given variable lookup.
    pub fn with_overrides<F>(mut self, var: F) -> Result<Self, OccamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("OCCAM_HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }

        if let Some(port) = var("OCCAM_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| OccamError::Config(format!("invalid OCCAM_PORT '{}'", port)))?;
        }

        if let Some(limit) = var("OCCAM_RATE_LIMIT") {
            self.server.rate_limit = limit.trim().parse().map_err(|_| {
                OccamError::Config(format!("invalid OCCAM_RATE_LIMIT '{}'", limit))
            })?;
        }

        if let Some(origins) = var("OCCAM_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(format) = var("OCCAM_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        if let Some(key) = var(API_KEY_ENV) {
            self.server.api_key = ApiKey::new(key);
        }

        Ok(self)
    }

    /// Build the prompt catalog: the standard texts patched with `[prompts]`.
    pub fn catalog(&self) -> Result<PromptCatalog, OccamError> {
        PromptCatalog::standard().with_overrides(&self.prompts)
    }
}

// =============================================================================
// TESTS
// =============================================================================
