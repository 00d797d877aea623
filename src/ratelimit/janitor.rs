//! Background sweep of expired rate-limit entries.
//!
//! Requests already sweep opportunistically, but an idle instance would keep
//! every key it has ever seen. The janitor removes expired entries on a fixed
//! interval independent of traffic.
//!
//! # Shutdown
//!
//! Call [`JanitorHandle::shutdown`] during graceful shutdown. Dropping the
//! handle without shutting down also signals the task to stop.

use super::limiter::AdmissionControl;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long `shutdown` waits for the task before giving up on it.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to a running janitor task.
pub struct JanitorHandle {
    stop: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

/// Spawn the janitor on the current tokio runtime.
///
/// Must be called from within a runtime.
pub fn spawn_janitor(limiter: Arc<dyn AdmissionControl>, every: Duration) -> JanitorHandle {
    let (stop, mut stop_rx) = watch::channel(false);
    let every = every.max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately; skip it so the first sweep
        // happens one full period after start.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = limiter.cleanup_expired();
                    if removed > 0 {
                        tracing::debug!(
                            target: "gatehouse.ratelimit.janitor",
                            removed,
                            "Swept expired rate limit entries"
                        );
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        tracing::debug!(target: "gatehouse.ratelimit.janitor", "Janitor stopping");
                        break;
                    }
                }
            }
        }
    });

    JanitorHandle {
        stop,
        handle: Some(handle),
    }
}

impl JanitorHandle {
    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);

        if let Some(handle) = self.handle.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(_) => tracing::debug!(
                    target: "gatehouse.ratelimit.janitor",
                    "Janitor stopped cleanly"
                ),
                Err(_) => tracing::warn!(
                    target: "gatehouse.ratelimit.janitor",
                    "Janitor did not stop within timeout"
                ),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for JanitorHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}
