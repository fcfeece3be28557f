//! Application-level configuration loading, including the runtime word catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::generator::{WordPair, default_word_pairs};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "WORD_MAFIA_CONFIG_PATH";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 5;
const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// How clients of the change feed learn about record updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTransport {
    /// Snapshots are pushed by the writer right after each successful write.
    #[default]
    Push,
    /// Subscribers re-read the record on a fixed interval.
    Poll,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    word_pairs: Vec<WordPair>,
    change_transport: ChangeTransport,
    poll_interval: Duration,
    max_write_attempts: u32,
    session_idle_timeout: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        word_pairs = app_config.word_pairs.len(),
                        transport = ?app_config.change_transport,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Catalog the word pairs are drawn from. Never empty.
    pub fn word_pairs(&self) -> &[WordPair] {
        &self.word_pairs
    }

    /// Transport used by change feed subscriptions.
    pub fn change_transport(&self) -> ChangeTransport {
        self.change_transport
    }

    /// Interval between two reads of the poll transport.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Read-modify-write attempts before a mutation gives up.
    pub fn max_write_attempts(&self) -> u32 {
        self.max_write_attempts
    }

    /// Inactivity after which a client session is forgotten.
    pub fn session_idle_timeout(&self) -> Duration {
        self.session_idle_timeout
    }

    /// Copy of this configuration using another transport.
    pub fn with_change_transport(mut self, transport: ChangeTransport) -> Self {
        self.change_transport = transport;
        self
    }

    /// Copy of this configuration using another poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            word_pairs: default_word_pairs(),
            change_transport: ChangeTransport::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    word_pairs: Option<Vec<WordPair>>,
    change_transport: Option<ChangeTransport>,
    poll_interval_ms: Option<u64>,
    max_write_attempts: Option<u32>,
    session_idle_timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();

        let word_pairs = match value.word_pairs {
            Some(pairs) => {
                let total = pairs.len();
                let valid: Vec<WordPair> = pairs
                    .into_iter()
                    .filter(WordPair::is_valid)
                    .map(|pair| WordPair::new(pair.normal.trim(), pair.mafia.trim()))
                    .collect();
                if valid.len() < total {
                    warn!(
                        dropped = total - valid.len(),
                        "ignored word pairs with blank or identical words"
                    );
                }
                if valid.is_empty() {
                    warn!("configured word catalog is empty; using built-in pairs");
                    defaults.word_pairs
                } else {
                    valid
                }
            }
            None => defaults.word_pairs,
        };

        Self {
            word_pairs,
            change_transport: value.change_transport.unwrap_or(defaults.change_transport),
            poll_interval: value
                .poll_interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            max_write_attempts: value
                .max_write_attempts
                .filter(|attempts| *attempts > 0)
                .unwrap_or(defaults.max_write_attempts),
            session_idle_timeout: value
                .session_idle_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle_timeout),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_catalog_and_transport() {
        let config = AppConfig::from_json(
            r#"{
                "word_pairs": [{ "normal": " Salt ", "mafia": "Pepper" }],
                "change_transport": "poll",
                "poll_interval_ms": 250,
                "max_write_attempts": 8,
                "session_idle_timeout_secs": 600
            }"#,
        )
        .unwrap();

        assert_eq!(config.word_pairs(), &[WordPair::new("Salt", "Pepper")]);
        assert_eq!(config.change_transport(), ChangeTransport::Poll);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.max_write_attempts(), 8);
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn invalid_pairs_are_dropped() {
        let config = AppConfig::from_json(
            r#"{ "word_pairs": [
                { "normal": "Tea", "mafia": "Tea" },
                { "normal": "", "mafia": "Milk" },
                { "normal": "Rain", "mafia": "Snow" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(config.word_pairs(), &[WordPair::new("Rain", "Snow")]);
    }

    #[test]
    fn empty_catalog_falls_back_to_defaults() {
        let config = AppConfig::from_json(r#"{ "word_pairs": [] }"#).unwrap();
        assert_eq!(config.word_pairs(), default_word_pairs().as_slice());
        assert_eq!(config.change_transport(), ChangeTransport::Push);
        assert_eq!(config.max_write_attempts(), DEFAULT_MAX_WRITE_ATTEMPTS);
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let config =
            AppConfig::from_json(r#"{ "poll_interval_ms": 0, "max_write_attempts": 0 }"#).unwrap();
        assert_eq!(
            config.poll_interval(),
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
        assert_eq!(config.max_write_attempts(), DEFAULT_MAX_WRITE_ATTEMPTS);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json(r#"{ "change_transport": "carrier-pigeon" }"#).is_err());
    }
}
