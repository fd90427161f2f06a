//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;

/// Where student records are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DataSource {
    /// Built-in in-memory roster.
    #[default]
    Fixtures,
    /// `SQLite` database under `data_dir`.
    Sqlite,
}

/// Deployment environment.
///
/// Development mode adds internal diagnostics to error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Main configuration for the student records server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,

    /// Backing source for student records.
    pub data_source: DataSource,

    /// Directory for the `SQLite` database.
    pub data_dir: PathBuf,

    /// Seed the database with the built-in roster when it is empty.
    pub seed: bool,

    /// Deployment environment.
    pub environment: Environment,

    /// Origins allowed by CORS. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_json: false,
            data_source: DataSource::default(),
            data_dir: PathBuf::from("./data"),
            seed: false,
            environment: Environment::default(),
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("port cannot be 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.host.is_empty() {
            return Err(Error::config("host cannot be empty"));
        }

        if let Some(origin) = self
            .cors_origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(Error::config(format!(
                "invalid CORS origin '{origin}', must start with http:// or https://"
            )));
        }

        if self.seed && self.data_source != DataSource::Sqlite {
            return Err(Error::config("--seed requires the sqlite data source"));
        }

        Ok(())
    }

    /// Get the path to the `SQLite` database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("students.db")
    }

    /// Get the server address as a string.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
