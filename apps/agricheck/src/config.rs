//! # Configuration
//!
//! Layered configuration: built-in defaults, then an optional TOML file,
//! then environment variables, then CLI flags (applied by the caller).
//!
//! ## File
//!
//! ```toml
//! endpoint = "https://lindas.admin.ch/query"
//! base_iri = "https://agriculture.ld.admin.ch/inspection/"
//! language = "de"
//! timeout_secs = 30
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```
//!
//! ## Environment Variables
//!
//! - `AGRICHECK_ENDPOINT`: SPARQL endpoint URL
//! - `AGRICHECK_BASE_IRI`: namespace used to rebuild ids from slugs
//! - `AGRICHECK_LANG`: language tag for labels and comments

use agricheck_core::{
    AgricheckError,
    primitives::{DEFAULT_BASE_IRI, DEFAULT_ENDPOINT, DEFAULT_LANGUAGE},
    sparql::validate_language,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "agricheck.toml";

/// Maximum accepted config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// CONFIG STRUCTURES
// =============================================================================

/// HTTP server bind settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub base_iri: String,
    pub language: String,
    pub timeout_secs: u64,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            base_iri: DEFAULT_BASE_IRI.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: 30,
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, AgricheckError> {
        toml::from_str(s).map_err(|e| AgricheckError::ConfigError(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, AgricheckError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            AgricheckError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(AgricheckError::ConfigError(format!(
                "Config file '{}' exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            AgricheckError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Read the file layer and apply overrides from `lookup`.
    ///
    /// An explicit `path` must exist. Without one, `agricheck.toml` in the
    /// working directory is used if present. The result is not validated;
    /// callers merge their own flags first and then call [`validate`].
    ///
    /// [`validate`]: AppConfig::validate
    pub fn read(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AgricheckError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    /// Apply `AGRICHECK_*` overrides from the given lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = non_empty("AGRICHECK_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(base) = non_empty("AGRICHECK_BASE_IRI") {
            self.base_iri = base;
        }
        if let Some(lang) = non_empty("AGRICHECK_LANG") {
            self.language = lang;
        }
    }

    /// Reject settings that would produce broken queries or links.
    pub fn validate(&self) -> Result<(), AgricheckError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(AgricheckError::ConfigError(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }
        if self.base_iri.is_empty() {
            return Err(AgricheckError::ConfigError(
                "base_iri must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(AgricheckError::ConfigError(
                "timeout_secs must be positive".to_string(),
            ));
        }
        validate_language(&self.language)
    }
}

// =============================================================================
// TESTS
// =============================================================================
