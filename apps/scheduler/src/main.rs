//! # Cotiza Scheduler
//!
//! Periodic batch runner: stale-quote alerts and loyalty promotions.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scheduler Process                                  │
//! │                                                                         │
//! │  env config ───► Database (SQLite) ───► Scheduler loop ───► SMTP       │
//! │                                             │                           │
//! │                                             └── run_pass every 6 h     │
//! │                                                 (first pass at start)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cotiza_db::{Database, DbConfig};
use cotiza_notify::{NotifyConfig, RandomPicker, Scheduler, SmtpSender};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .init();

    info!("Starting Cotiza scheduler...");

    // Load configuration
    let config = NotifyConfig::load()?;
    info!(
        database = %config.database_path,
        pass_interval_secs = config.pass_interval_secs,
        smtp_host = %config.smtp.host,
        "Configuration loaded"
    );

    // Connect to the database (runs migrations)
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Connected to SQLite");

    // Outbound collaborators
    let sender = Arc::new(SmtpSender::new(config.smtp.clone())?);
    let picker = Arc::new(RandomPicker);

    // Build and spawn the scheduler loop
    let period = Duration::from_secs(config.pass_interval_secs);
    let (scheduler, handle) = Scheduler::new(db.clone(), sender, picker, period);
    let scheduler_task = tokio::spawn(scheduler.run());

    info!("Scheduler running. Press Ctrl+C to stop.");

    // Wait for shutdown signal, then stop between passes
    shutdown_signal().await;
    handle.shutdown().await?;
    scheduler_task.await?;

    db.close().await;
    info!("Scheduler shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
