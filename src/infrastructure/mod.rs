//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Mathpix OCR client.
pub mod mathpix;
/// Matrix homeserver client and sync loop.
pub mod matrix;

pub use config::{AppConfig, CliArgs, ConfigError, LoadedConfig, LogLevel, StorageManager};
pub use mathpix::MathpixClient;
pub use matrix::{MatrixClient, SyncLoop, SyncSettings};
