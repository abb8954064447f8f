//! Application configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use super::storage::ConfigError;
use crate::domain::entities::{Credentials, FormattingMode, Secret};
use crate::infrastructure::mathpix::DEFAULT_ENDPOINT;

pub(super) const APP_NAME: &str = "mathpix-bot";
pub(super) const APP_QUALIFIER: &str = "org";
pub(super) const APP_ORGANIZATION: &str = "mathpix-bot";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Bot configuration, loaded from TOML and overridden by CLI/env.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path. Logs go to stderr when unset.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Homeserver account settings.
    #[serde(default)]
    pub matrix: MatrixConfig,

    /// OCR service settings.
    #[serde(default)]
    pub mathpix: MathpixConfig,

    /// Reply layout.
    #[serde(default)]
    pub formatting: FormattingConfig,
}

/// Matrix account configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Homeserver base URL.
    #[serde(default = "default_homeserver")]
    pub homeserver: String,

    /// Fully qualified bot user id.
    #[serde(default)]
    pub user_id: String,

    /// Access token of the bot account.
    #[serde(default)]
    pub access_token: String,

    /// Join rooms automatically on invite.
    #[serde(default = "default_true")]
    pub autojoin: bool,

    /// Long-poll timeout for `/sync` in seconds.
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: u64,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            homeserver: default_homeserver(),
            user_id: String::new(),
            access_token: String::new(),
            autojoin: true,
            sync_timeout_secs: default_sync_timeout(),
        }
    }
}

impl fmt::Debug for MatrixConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixConfig")
            .field("homeserver", &self.homeserver)
            .field("user_id", &self.user_id)
            .field("access_token", &Secret::new(self.access_token.as_str()))
            .field("autojoin", &self.autojoin)
            .field("sync_timeout_secs", &self.sync_timeout_secs)
            .finish()
    }
}

impl MatrixConfig {
    /// Returns the `/sync` long-poll timeout.
    #[must_use]
    pub const fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }
}

/// Mathpix API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct MathpixConfig {
    /// Application id.
    #[serde(default)]
    pub app_id: String,

    /// Application key.
    #[serde(default)]
    pub app_key: String,

    /// OCR endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

impl Default for MathpixConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_ocr_timeout(),
        }
    }
}

impl fmt::Debug for MathpixConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MathpixConfig")
            .field("app_id", &self.app_id)
            .field("app_key", &Secret::new(self.app_key.as_str()))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl MathpixConfig {
    /// Returns the OCR request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reply formatting configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FormattingConfig {
    /// Layout of result replies.
    #[serde(default)]
    pub mode: FormattingMode,
}

fn default_homeserver() -> String {
    "https://matrix.org".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

const fn default_sync_timeout() -> u64 {
    30
}

const fn default_ocr_timeout() -> u64 {
    60
}

impl AppConfig {
    /// Merges CLI arguments and environment overrides into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(homeserver) = args.homeserver {
            self.matrix.homeserver = homeserver;
        }
        if let Some(user_id) = args.user_id {
            self.matrix.user_id = user_id;
        }
        if let Some(access_token) = args.access_token {
            self.matrix.access_token = access_token;
        }
        if let Some(app_id) = args.app_id {
            self.mathpix.app_id = app_id;
        }
        if let Some(app_key) = args.app_key {
            self.mathpix.app_key = app_key;
        }
        if let Some(endpoint) = args.endpoint {
            self.mathpix.endpoint = endpoint;
        }
        if let Some(mode) = args.formatting_mode {
            self.formatting.mode = mode;
        }
    }

    /// Checks that every required value is present and returns the OCR
    /// credentials.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingValues` naming every empty key.
    pub fn validate(&self) -> Result<Credentials, ConfigError> {
        let mut missing: Vec<String> = [
            ("homeserver", &self.matrix.homeserver),
            ("user_id", &self.matrix.user_id),
            ("access_token", &self.matrix.access_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| format!("matrix.{key}"))
        .collect();

        let credentials = Credentials::new(
            self.mathpix.app_id.as_str(),
            Secret::new(self.mathpix.app_key.as_str()),
            self.mathpix.endpoint.as_str(),
        );

        match credentials {
            Ok(credentials) if missing.is_empty() => Ok(credentials),
            Ok(_) => Err(ConfigError::missing_values(&missing)),
            Err(keys) => {
                missing.extend(keys.into_iter().map(|key| format!("mathpix.{key}")));
                Err(ConfigError::missing_values(&missing))
            }
        }
    }
}
