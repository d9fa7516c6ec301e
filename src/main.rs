//! Runs the ticket countdown until Ctrl+C or SIGTERM.

use tokio::sync::watch;

use queue_eta::config;
use queue_eta::engine::Engine;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load configuration
    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!(
        "Starting ETA scheduler (interval: {}ms, threshold: {}min, alpha: {})",
        config.scheduler.update_interval.as_millis(),
        config.scheduler.notification_threshold_minutes,
        config.eta.ema_alpha
    );

    let engine = Engine::from_config(&config).await.map_err(|e| {
        log::error!("Engine startup error ({}): {}", e.kind(), e);
        std::io::Error::other(e.to_string())
    })?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = engine.scheduler.clone().spawn(shutdown_rx);

    shutdown_signal().await;
    log::info!("Shutdown signal received, stopping scheduler...");
    let _ = shutdown_tx.send(true);

    if let Err(e) = handle.await {
        log::error!("Scheduler task ended abnormally: {}", e);
    }

    log::info!("ETA scheduler stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                // Wait forever if signal handler fails
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
