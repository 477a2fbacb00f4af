//! Graceful shutdown handling

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info};

/// Shutdown coordinator
pub struct ShutdownCoordinator {
    notify: Arc<Notify>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a shutdown notifier
    pub fn subscribe(&self) -> ShutdownNotifier {
        ShutdownNotifier {
            notify: self.notify.clone(),
            triggered: self.triggered.clone(),
        }
    }

    /// Wait for Ctrl+C or SIGTERM, then notify subscribers
    pub async fn wait_for_signal(&self) {
        wait_for_os_signal().await;
        self.shutdown();
    }

    /// Trigger shutdown manually
    pub fn shutdown(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            info!("Shutdown triggered");
        }
        self.notify.notify_waiters();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown notifier for components
#[derive(Clone)]
pub struct ShutdownNotifier {
    notify: Arc<Notify>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownNotifier {
    /// Resolve once shutdown has been triggered, even if it already was
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }

    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

async fn wait_for_os_signal() {
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
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_are_released() {
        let coordinator = ShutdownCoordinator::new();
        let notifier1 = coordinator.subscribe();
        let notifier2 = coordinator.subscribe();

        let handle1 = tokio::spawn(async move {
            notifier1.wait().await;
            1
        });
        let handle2 = tokio::spawn(async move {
            notifier2.wait().await;
            2
        });

        tokio::task::yield_now().await;
        coordinator.shutdown();

        assert_eq!(handle1.await.unwrap(), 1);
        assert_eq!(handle2.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.shutdown();

        let notifier = coordinator.subscribe();
        assert!(notifier.is_shutdown());
        notifier.wait().await;
    }
}
