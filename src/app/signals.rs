//! Signal handling for graceful shutdown
//!
//! CTRL-C or SIGTERM is turned into a broadcast that stops the HTTP server and
//! the refresh scheduler.

use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Broadcasts shutdown when the process receives a termination signal
pub struct SignalHandler {
    shutdown_tx: broadcast::Sender<()>,
}

impl SignalHandler {
    /// Create a new signal handler with the given shutdown broadcaster
    pub fn new(shutdown_tx: broadcast::Sender<()>) -> Self {
        Self { shutdown_tx }
    }

    /// Listen for CTRL-C and SIGTERM in a background task
    ///
    /// Whichever arrives first is broadcast to every subscriber.
    pub fn setup(&self) -> JoinHandle<()> {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received Ctrl+C, shutting down");
                },
                _ = terminate => {
                    info!("Received terminate signal, shutting down");
                },
            }

            let _ = shutdown_tx.send(());
        })
    }
}

/// Create a shutdown broadcaster
pub fn create_shutdown_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    broadcast::channel(1)
}

/// Resolve once shutdown has been broadcast
pub async fn wait_for_shutdown_signal(mut shutdown_rx: broadcast::Receiver<()>) {
    let _ = shutdown_rx.recv().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Test signal handler setup
    #[tokio::test]
    async fn test_signal_handler_setup() {
        let (tx, _rx) = create_shutdown_channel();
        let handler = SignalHandler::new(tx);

        let handle = handler.setup();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }

    /// Test wait for shutdown
    #[tokio::test]
    async fn test_wait_for_shutdown() {
        let (tx, rx) = create_shutdown_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
        });

        let result = timeout(Duration::from_millis(200), wait_for_shutdown_signal(rx)).await;
        assert!(result.is_ok());
    }

    /// Test every subscriber is notified
    #[tokio::test]
    async fn test_every_subscriber_is_notified() {
        let (tx, _) = create_shutdown_channel();
        let mut server_rx = tx.subscribe();
        let mut scheduler_rx = tx.subscribe();

        let _ = tx.send(());

        assert!(timeout(Duration::from_millis(100), server_rx.recv()).await.is_ok());
        assert!(timeout(Duration::from_millis(100), scheduler_rx.recv()).await.is_ok());
    }

    /// Test dropped sender releases waiters
    #[tokio::test]
    async fn test_dropped_sender_releases_waiters() {
        let (tx, rx) = create_shutdown_channel();
        drop(tx);

        let result = timeout(Duration::from_millis(100), wait_for_shutdown_signal(rx)).await;
        assert!(result.is_ok());
    }
}
