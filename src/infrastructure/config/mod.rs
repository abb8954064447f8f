//! Application configuration.

pub mod app_config;
/// Command line arguments.
pub mod args;
/// Configuration file storage.
pub mod storage;

pub use app_config::{AppConfig, FormattingConfig, LogLevel, MathpixConfig, MatrixConfig};
pub use args::CliArgs;
pub use storage::{ConfigError, LoadedConfig, StorageManager};
