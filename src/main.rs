use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mathpix_bot::application::{OcrEventHandler, ResponseFormatter};
use mathpix_bot::domain::entities::Secret;
use mathpix_bot::infrastructure::{
    AppConfig, CliArgs, LoadedConfig, MathpixClient, MatrixClient, StorageManager, SyncLoop,
    SyncSettings,
};

const MATRIX_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config() -> Result<LoadedConfig> {
    let args = CliArgs::parse();
    let storage = StorageManager::new()?;
    let mut loaded = storage.load_config(args.config.as_deref())?;
    loaded.config.merge_with_args(args);
    Ok(loaded)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let LoadedConfig {
        config,
        path: config_path,
        created,
    } = load_config()?;
    init_logging(&config)?;

    if created {
        info!(path = %config_path.display(), "Config file not found, wrote default template");
    }

    let credentials = config
        .validate()
        .wrap_err_with(|| format!("fill in the configuration at {}", config_path.display()))?;

    info!(
        version = mathpix_bot::VERSION,
        homeserver = %config.matrix.homeserver,
        user_id = %config.matrix.user_id,
        mode = %config.formatting.mode,
        "Starting {}",
        mathpix_bot::NAME
    );

    let matrix = Arc::new(MatrixClient::new(
        config.matrix.homeserver.as_str(),
        Secret::new(config.matrix.access_token.as_str()),
        MATRIX_REQUEST_TIMEOUT,
    )?);
    let mathpix = Arc::new(MathpixClient::new(credentials, config.mathpix.timeout())?);

    let handler = OcrEventHandler::new(
        matrix.clone(),
        mathpix,
        ResponseFormatter::new(config.formatting.mode),
    );

    let settings = SyncSettings {
        user_id: config.matrix.user_id.clone(),
        autojoin: config.matrix.autojoin,
        timeout: config.matrix.sync_timeout(),
    };

    SyncLoop::new(matrix, handler, settings)
        .run(shutdown_signal())
        .await;

    Ok(())
}
