//! PerkHub Server — Loyalty Program Platform
//!
//! Main entry point that wires all crates together and runs the daemon.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use perkhub_core::config::store::StoreBackend;
use perkhub_core::config::AppConfig;
use perkhub_core::error::AppError;
use perkhub_core::traits::EventSink;
use perkhub_store::store::postgres::{
    PgApprovalStore, PgCatalogStore, PgLedgerStore, PgNotificationStore,
};
use perkhub_store::store::remote::RemoteLedgerStore;
use perkhub_store::{ApprovalStore, CatalogStore, LedgerStore, NotificationStore};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("PERKHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PerkHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = perkhub_store::DatabasePool::connect(&config.database).await?;
    perkhub_store::migration::run_migrations(db_pool.pool()).await?;

    // ── Step 2: Store adapters ───────────────────────────────────
    let retry = config.store.retry.clone();
    let pool = db_pool.pool().clone();

    let ledger: Arc<dyn LedgerStore> = match config.store.backend {
        StoreBackend::Postgres => {
            tracing::info!("Using PostgreSQL ledger store");
            Arc::new(PgLedgerStore::new(pool.clone(), retry.clone()))
        }
        StoreBackend::Remote => {
            tracing::info!(
                "Using remote ledger store at {}",
                config.store.remote.base_url
            );
            Arc::new(RemoteLedgerStore::new(&config.store.remote)?)
        }
    };
    let approvals: Arc<dyn ApprovalStore> =
        Arc::new(PgApprovalStore::new(pool.clone(), retry.clone()));
    let notifications: Arc<dyn NotificationStore> =
        Arc::new(PgNotificationStore::new(pool.clone(), retry.clone()));
    let catalog: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(pool, retry));

    // ── Step 3: Realtime fan-out ─────────────────────────────────
    tracing::info!("Initializing realtime fan-out...");
    let registry = Arc::new(perkhub_realtime::ConnectionRegistry::new(
        config.realtime.clone(),
    ));
    let events: Arc<dyn EventSink> = Arc::new(perkhub_realtime::FanoutDispatcher::new(
        Arc::clone(&registry),
    ));

    // ── Step 4: Services ─────────────────────────────────────────
    tracing::info!("Initializing services...");
    let services = perkhub_service::ServiceContext::new(
        ledger,
        approvals,
        notifications,
        catalog,
        events,
        config.approvals.clone(),
    );
    tracing::info!("Services initialized");

    // ── Step 5: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 6: Background sweeps ────────────────────────────────
    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting sweep worker...");

        let runner = perkhub_worker::SweepRunner::new(config.worker.clone())
            .with_sweep(Arc::new(perkhub_worker::ApprovalExpirySweep::new(
                Arc::clone(&services.approvals),
            )))
            .with_sweep(Arc::new(perkhub_worker::NotificationCleanupSweep::new(
                Arc::clone(&services.notifications),
                config.realtime.notifications.clone(),
            )));

        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run_all().await;
            runner.run(worker_cancel).await;
        });

        tracing::info!("Sweep worker started");
        Some(handle)
    } else {
        tracing::info!("Sweep worker disabled");
        None
    };

    tracing::info!("PerkHub server running");

    // ── Step 7: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(30), handle).await;
    }

    db_pool.close().await;
    tracing::info!("PerkHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
