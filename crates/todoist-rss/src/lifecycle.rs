//! Process lifecycle: shutdown signalling and tracking of background work.
//!
//! A [`Lifecycle`] is created once at startup and handed to the server. It
//! owns the shutdown token that stops the listener and the tracker for work
//! that outlives a response (closing tasks after a read), so shutdown can
//! wait for that work within the grace period.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tokio_util::task::TaskTracker;
use tracing::info;

/// Shutdown and background-work context shared by the server.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    shutdown: CancellationToken,
    tracker: TaskTracker,
    grace: Duration,
}

impl Lifecycle {
    #[must_use]
    pub fn new(grace: Duration) -> Self {
        Self {
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            grace,
        }
    }

    /// Time allowed for in-flight work once shutdown begins.
    #[must_use]
    pub const fn grace(&self) -> Duration {
        self.grace
    }

    /// Run `work` in the background, tracked for shutdown draining.
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(work);
    }

    /// Begin shutdown.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Future that resolves once shutdown has been requested.
    #[must_use]
    pub fn shutdown_requested(&self) -> WaitForCancellationFutureOwned {
        self.shutdown.clone().cancelled_owned()
    }

    /// Wait for SIGINT/SIGTERM (or an explicit request), then begin shutdown.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            name = termination_signal() => {
                info!(signal = name, grace_secs = self.grace.as_secs(), "Termination signal received");
            }
            () = self.shutdown.cancelled() => {
                info!("Shutdown requested");
            }
        }
        self.request_shutdown();
    }

    /// Wait for tracked background work, giving up at `deadline`.
    ///
    /// Returns `true` when all work finished in time.
    pub async fn drain_until(&self, deadline: Instant) -> bool {
        self.tracker.close();
        timeout_at(deadline, self.tracker.wait()).await.is_ok()
    }

    /// Wait for tracked background work with no deadline.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// Resolve with the name of the first termination signal received.
async fn termination_signal() -> &'static str {
    let interrupt = async {
        signal::ctrl_c()
            .await
            .expect("failed to listen for SIGINT");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
