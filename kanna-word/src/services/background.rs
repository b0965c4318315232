//! Detached background work
//!
//! Counter updates on cache hits and pronunciation clips run here, outside the
//! command that triggered them. Every task is tracked so shutdown can wait
//! for in-flight work or abandon it deterministically.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Task group scoped to the process lifetime
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
    cancel_token: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` detached. Dropped without completing if the group is cancelled.
    pub fn spawn<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel_token = self.cancel_token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!(task = label, "Background task abandoned");
                }
                _ = task => {}
            }
        });
    }

    /// Number of tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every task spawned so far has finished
    ///
    /// The group stays usable afterwards.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Give in-flight work `grace` to finish, then cancel the rest
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();

        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "Waiting for background tasks");
        }

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(
                pending = self.tracker.len(),
                "Background tasks still running after {:?}, cancelling",
                grace
            );
            self.cancel_token.cancel();
            self.tracker.wait().await;
        }
    }

    /// Cancel every task immediately
    pub async fn abort(&self) {
        self.tracker.close();
        self.cancel_token.cancel();
        self.tracker.wait().await;
    }
}
