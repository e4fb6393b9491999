//! Configuration management for the SQL tutor.
//!
//! Handles loading configuration from a TOML file, with environment variables
//! (`PORT`, `DATABASE_URL`) layered on top and CLI flags applied last.

use crate::error::{Result, TutorError};
use crate::policy::PolicyMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database the learner queries run against.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Which query policy guards the sandbox.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Where lesson and tutorial content comes from.
    #[serde(default)]
    pub content: ContentConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite::memory:`, `sqlite:tutor.db`, `postgres://...`).
    #[serde(default = "default_database_url")]
    pub url: String,

    /// SQL script run once after connecting.
    ///
    /// In-memory SQLite databases fall back to the built-in tutorial schema.
    #[serde(default)]
    pub seed: Option<PathBuf>,

    /// Per-query timeout enforced by the database client.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Maximum rows returned from a single query.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_max_rows() -> usize {
    1000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            seed: None,
            query_timeout_secs: default_query_timeout_secs(),
            max_rows: default_max_rows(),
        }
    }
}

/// Query policy settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    #[serde(default)]
    pub mode: PolicyMode,
}

/// Content settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ContentConfig {
    /// Directory holding `levels.toml` and/or `tutorials.toml`.
    ///
    /// Files missing from the directory fall back to the built-in content.
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sql-tutor")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TutorError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            TutorError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies `PORT` and `DATABASE_URL` from the environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("DATABASE_URL").ok().as_deref(),
        )
    }

    fn apply_overrides(&mut self, port: Option<&str>, database_url: Option<&str>) -> Result<()> {
        if let Some(port) = port {
            self.server.port = port
                .parse()
                .map_err(|_| TutorError::config(format!("Invalid PORT value '{port}'")))?;
        }
        if let Some(url) = database_url {
            self.database.url = url.to_string();
        }
        Ok(())
    }
}
