use tokio::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// Shutdown coordinator shared by the server and background work.
///
/// One root [`CancellationToken`] is cancelled on SIGINT/SIGTERM (or an
/// explicit [`ShutdownCoordinator::shutdown`]). Subsystems hold child tokens
/// from [`ShutdownCoordinator::token`] and stop retrying or waiting once it
/// fires. Work that must outlive the request that started it is spawned on
/// [`ShutdownCoordinator::tracker`] and drained before cleanup.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A child token cancelled together with the coordinator.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn tracker(&self) -> TaskTracker {
        self.tracker.clone()
    }

    /// Close the tracker and wait for every task spawned on it.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Initiate shutdown. Idempotent.
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            info!("Initiating graceful shutdown");
            self.token.cancel();
        }
    }

    /// Resolves once shutdown has been initiated.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Wait for SIGINT/SIGTERM, then initiate shutdown.
    ///
    /// Returns early if shutdown was initiated some other way.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            },
            _ = terminate() => {
                info!("Received SIGTERM, initiating graceful shutdown");
            },
            _ = self.token.cancelled() => return,
        }

        self.shutdown();
    }
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Future for `axum::serve(..).with_graceful_shutdown` without coordination.
pub async fn shutdown_signal() {
    ShutdownCoordinator::new().wait_for_signal().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_cancels_child_tokens() {
        let coordinator = ShutdownCoordinator::new();
        let token = coordinator.token();
        assert!(!coordinator.is_shutting_down());

        coordinator.shutdown();
        coordinator.shutdown();

        assert!(coordinator.is_shutting_down());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_wait_for_signal_returns_after_explicit_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_signal().await });

        coordinator.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelling_child_leaves_root_running() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.token().cancel();
        assert!(!coordinator.is_shutting_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_waits_for_tracked_tasks() {
        let coordinator = ShutdownCoordinator::new();
        let token = coordinator.token();
        let task = coordinator.tracker().spawn(async move {
            token.cancelled().await;
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        });

        coordinator.shutdown();
        let started = tokio::time::Instant::now();
        coordinator.drain().await;

        assert!(task.is_finished());
        assert_eq!(started.elapsed(), std::time::Duration::from_millis(50));
    }
}
