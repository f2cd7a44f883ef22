//! rolld - dice rolling server daemon
//!
//! Rolls batches of dice, with advantage and disadvantage, over HTTP and
//! WebSocket request/reply.

pub mod api;
pub mod batch;
pub mod config;
pub mod dice;

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

pub use config::{Config, ConfigError};

use api::AppState;
use batch::BatchProcessor;

/// The rolld server instance
pub struct Server {
    config: Config,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        let state = AppState::new(BatchProcessor::new(config.max_dice), config.die_source());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("rolld listening on {}", local_addr);
        if self.config.seed.is_some() {
            info!("dice are seeded, results are reproducible");
        }

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("rolld shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
