use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::net::TcpListener;
use tokio::signal;

use crate::backend::{self, AppState};
use crate::cli::Cli;
use crate::config::{Config, ConfigProvider};
use crate::utils::storage;

/// Loads the configuration, prepares the upload directory and serves until shutdown.
///
/// Configuration problems surface here, before the listener is bound.
pub async fn run(opts: Cli) -> Result<()> {
    let config = Config::load(&opts.config)
        .await
        .with_context(|| format!("failed to load config from {}", opts.config.display()))?;

    storage::prepare_upload_dir(&config.upload_path).await?;

    let provider = if opts.reload_config {
        info!("config will be re-read from {} on every upload", opts.config.display());
        ConfigProvider::Reload(opts.config.clone())
    } else {
        ConfigProvider::Fixed(Arc::new(config.clone()))
    };

    let app = backend::router(AppState { config: provider }, &config);

    let addr = format!("{}:{}", opts.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!(
        "imgdrop listening on {}, storing uploads in {}",
        addr,
        config.upload_path.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("imgdrop shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to listen for ctrl+c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
