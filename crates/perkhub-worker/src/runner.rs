//! Sweep runner — interval loop that executes every registered sweep
//! until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing;

use perkhub_core::config::WorkerConfig;

use crate::sweeps::Sweep;

/// Runs the registered sweeps on a fixed interval.
pub struct SweepRunner {
    /// Sweeps to run, in order.
    sweeps: Vec<Arc<dyn Sweep>>,
    /// Worker configuration.
    config: WorkerConfig,
}

impl SweepRunner {
    /// Create a new runner.
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            sweeps: Vec::new(),
            config,
        }
    }

    /// Register a sweep.
    pub fn with_sweep(mut self, sweep: Arc<dyn Sweep>) -> Self {
        self.sweeps.push(sweep);
        self
    }

    /// Run until the cancel signal flips to `true`. Each pass runs every
    /// sweep; a failing sweep is logged and the others still run.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        if !self.config.enabled {
            tracing::info!("Sweep worker disabled by configuration");
            return;
        }

        tracing::info!(
            "Sweep worker started with interval={}s, sweeps={:?}",
            self.config.sweep_interval_seconds,
            self.sweeps.iter().map(|s| s.name()).collect::<Vec<_>>()
        );

        let interval = Duration::from_secs(self.config.sweep_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Sweep worker received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(interval) => {
                    self.run_all().await;
                }
            }
        }

        tracing::info!("Sweep worker shut down");
    }

    /// Run every sweep once. Exposed for tests and for an eager first
    /// pass at startup.
    pub async fn run_all(&self) {
        for sweep in &self.sweeps {
            match sweep.run().await {
                Ok(touched) => {
                    tracing::debug!("Sweep '{}' touched {} rows", sweep.name(), touched);
                }
                Err(e) => {
                    tracing::warn!("Sweep '{}' failed: {}", sweep.name(), e);
                }
            }
        }
    }
}
