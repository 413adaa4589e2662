use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::{models::date::Locale, storage::json::DEFAULT_BACKUP_LIMIT};

pub const STORE_ENV: &str = "DAYBOOK_STORE";
pub const LOCALE_ENV: &str = "DAYBOOK_LOCALE";
pub const BACKUPS_ENV: &str = "DAYBOOK_BACKUPS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported locale '{0}' (expected 'en' or 'it')")]
    UnsupportedLocale(String),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Storage file holding the persisted tasks
    pub store_path: PathBuf,
    pub locale: Locale,
    /// How many previous copies of the storage file to keep
    pub backup_limit: usize,
}

/// Values given explicitly on the command line; they win over the environment
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub store_path: Option<PathBuf>,
    pub locale: Option<String>,
}

impl Config {
    /// Resolves the configuration from the command line, then the process
    /// environment, then defaults.
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    pub fn resolve(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let store_path = overrides
            .store_path
            .or_else(|| env(STORE_ENV).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
            .unwrap_or_else(default_store_path);

        let locale = match overrides.locale.or_else(|| env(LOCALE_ENV)) {
            Some(raw) => raw.parse().map_err(ConfigError::UnsupportedLocale)?,
            None => Locale::default(),
        };

        let backup_limit = match env(BACKUPS_ENV) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    name: BACKUPS_ENV,
                    value: raw,
                })?,
            None => DEFAULT_BACKUP_LIMIT,
        };

        let config = Config {
            store_path,
            locale,
            backup_limit,
        };
        debug!(?config, "resolved configuration");
        Ok(config)
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("daybook")
        .join("store.json")
}
