//! Command line arguments.

use super::app_config::LogLevel;
use crate::domain::entities::FormattingMode;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments. Credentials may also come from the environment.
#[derive(Debug, Parser)]
#[command(
    name = "mathpix-bot",
    version,
    about = "Matrix bot that replies to images with Mathpix OCR results",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Homeserver base URL.
    #[arg(long, env = "MATRIX_HOMESERVER", value_name = "URL")]
    pub homeserver: Option<String>,

    /// Bot user id.
    #[arg(long, env = "MATRIX_USER_ID")]
    pub user_id: Option<String>,

    /// Bot access token.
    #[arg(long, env = "MATRIX_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Mathpix application id.
    #[arg(long, env = "MATHPIX_APP_ID")]
    pub app_id: Option<String>,

    /// Mathpix application key.
    #[arg(long, env = "MATHPIX_APP_KEY", hide_env_values = true)]
    pub app_key: Option<String>,

    /// Mathpix OCR endpoint.
    #[arg(long, env = "MATHPIX_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Reply layout (`single` or `split`).
    #[arg(long, value_name = "MODE", value_parser = str::parse::<FormattingMode>)]
    pub formatting_mode: Option<FormattingMode>,
}
