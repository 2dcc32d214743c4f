//! Runtime configuration for hosts embedding the core.
//!
//! Values come from environment variables with defaults:
//! - `MYTASKS_DB_PATH`: snapshot database file (default `<tmp>/mytasks.sqlite3`).
//! - `MYTASKS_REMINDER_DELAY_SECS`: reminder delay in seconds (default 10).
//! - `MYTASKS_LOG_LEVEL`: log level (default per build mode).

use crate::logging::default_log_level;
use crate::reminder::ReminderPolicy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_ENV: &str = "MYTASKS_DB_PATH";
pub const REMINDER_DELAY_ENV: &str = "MYTASKS_REMINDER_DELAY_SECS";
pub const LOG_LEVEL_ENV: &str = "MYTASKS_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "mytasks.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub reminder_delay: Duration,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            reminder_delay: ReminderPolicy::default().delay,
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = read(REMINDER_DELAY_ENV) {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: REMINDER_DELAY_ENV,
                    value: raw.clone(),
                })?;
            config.reminder_delay = Duration::from_secs(secs);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = level;
        }

        Ok(config)
    }

    pub fn reminder_policy(&self) -> ReminderPolicy {
        ReminderPolicy {
            delay: self.reminder_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DB_PATH_ENV, REMINDER_DELAY_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = CoreConfig::from_lookup(lookup(&[(DB_PATH_ENV, "  ")])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.reminder_delay, Duration::from_secs(10));
    }

    #[test]
    fn overrides_are_read() {
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, "/data/tasks.db"),
            (REMINDER_DELAY_ENV, "90"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/tasks.db"));
        assert_eq!(config.reminder_policy().delay, Duration::from_secs(90));
    }

    #[test]
    fn invalid_delay_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(REMINDER_DELAY_ENV, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: REMINDER_DELAY_ENV,
                value: "soon".to_string()
            }
        );
    }
}
