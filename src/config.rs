//! Layered runtime settings.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `DPG_WORKFLOW__*` environment variables. Nested keys use a double
//! underscore, for example `DPG_WORKFLOW__DATABASE__URL`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Prefix of environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "DPG_WORKFLOW";

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/dpg_workflow";
const DEFAULT_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or a value could not be deserialized.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    /// A loaded value is unusable.
    #[error("invalid setting {key}: {reason}")]
    Invalid {
        /// Dotted key of the offending setting.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Complete runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Database connection settings.
    pub database: DatabaseSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before giving up.
    pub connect_timeout_secs: u64,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_owned(),
            json: false,
        }
    }
}

impl Settings {
    /// Loads settings from defaults, the optional file at `path`, and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the file cannot be read, a value has
    /// the wrong type, or the pool size is zero.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_environment(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_environment(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder()
            .set_default("database.url", DEFAULT_DATABASE_URL)?
            .set_default("database.max_connections", DEFAULT_MAX_CONNECTIONS)?
            .set_default("database.connect_timeout_secs", DEFAULT_CONNECT_TIMEOUT_SECS)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            .set_default("logging.json", false)?;

        if let Some(file) = path {
            builder = builder.add_source(config::File::from(file).required(true));
        }

        builder = builder.add_source(
            environment
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid {
                key: "database.max_connections",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.database.connect_timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "database.connect_timeout_secs",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.database.url.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "database.url",
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}
