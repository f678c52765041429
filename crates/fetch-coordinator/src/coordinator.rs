//! Single-flight guard with progress reporting
//!
//! One bulk refresh may run at a time. The progress record is only ever read
//! or written under one mutex, which is never held across an `.await`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Snapshot of the current (or last) bulk operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchProgress {
    pub total: usize,
    pub current: usize,
    pub is_running: bool,
}

/// Returned by [`FetchCoordinator::start_operation`] when another operation holds the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy(pub FetchProgress);

impl fmt::Display for Busy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fetch already running ({}/{})",
            self.0.current, self.0.total
        )
    }
}

impl std::error::Error for Busy {}

/// Handle to the shared progress state. Clones share the same slot.
#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    progress: Arc<Mutex<FetchProgress>>,
    poll_interval: Duration,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            progress: Arc::new(Mutex::new(FetchProgress::default())),
            poll_interval,
        }
    }

    /// Current progress, read under the same lock used for updates
    pub fn progress(&self) -> FetchProgress {
        *lock(&self.progress)
    }

    /// Take the single-flight slot for an operation of `total` items.
    ///
    /// When an operation is already running its progress is left untouched
    /// and returned inside [`Busy`].
    pub fn start_operation(&self, total: usize) -> Result<RefreshGuard, Busy> {
        let mut progress = lock(&self.progress);
        if progress.is_running {
            return Err(Busy(*progress));
        }

        *progress = FetchProgress {
            total,
            current: 0,
            is_running: true,
        };
        debug!(total, "Fetch operation started");

        Ok(RefreshGuard {
            progress: self.progress.clone(),
            finished: false,
        })
    }

    /// Poll until no operation is running or `timeout` elapses.
    ///
    /// Returns true as soon as the coordinator is idle. This polls at a fixed
    /// interval, which is fine for refreshes that take seconds; it is not
    /// meant for high-frequency synchronization.
    pub async fn wait_for_progress_complete(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        while self.progress().is_running {
            let now = Instant::now();
            if now >= deadline {
                warn!(?timeout, "Timeout waiting for previous fetch operation to complete");
                return false;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }

        true
    }

    /// Wait for the slot to free up, then take it.
    ///
    /// Keeps waiting if another caller grabs the slot first, until `timeout`.
    pub async fn start_when_idle(
        &self,
        total: usize,
        timeout: Duration,
    ) -> Result<RefreshGuard, Busy> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.start_operation(total) {
                Ok(guard) => return Ok(guard),
                Err(busy) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() || !self.wait_for_progress_complete(remaining).await {
                        return Err(busy);
                    }
                }
            }
        }
    }
}

impl Default for FetchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of holding the single-flight slot. Dropping it ends the operation.
#[derive(Debug)]
pub struct RefreshGuard {
    progress: Arc<Mutex<FetchProgress>>,
    finished: bool,
}

impl RefreshGuard {
    /// Mark one more item as done; never goes past `total`
    pub fn advance(&self) {
        let mut progress = lock(&self.progress);
        if progress.current < progress.total {
            progress.current += 1;
        }
    }

    pub fn progress(&self) -> FetchProgress {
        *lock(&self.progress)
    }

    /// End the operation, leaving `total`/`current` frozen until the next start
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let mut progress = lock(&self.progress);
        progress.is_running = false;
        debug!(
            total = progress.total,
            current = progress.current,
            "Fetch operation finished"
        );
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock(progress: &Mutex<FetchProgress>) -> MutexGuard<'_, FetchProgress> {
    progress.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_coordinator_is_idle() {
        let coordinator = FetchCoordinator::new();
        assert_eq!(coordinator.progress(), FetchProgress::default());
    }

    #[test]
    fn test_start_advance_finish() {
        let coordinator = FetchCoordinator::new();
        let guard = coordinator.start_operation(3).unwrap();

        assert_eq!(
            coordinator.progress(),
            FetchProgress {
                total: 3,
                current: 0,
                is_running: true
            }
        );

        guard.advance();
        guard.advance();
        assert_eq!(coordinator.progress().current, 2);

        guard.finish();
        assert_eq!(
            coordinator.progress(),
            FetchProgress {
                total: 3,
                current: 2,
                is_running: false
            }
        );
    }

    #[test]
    fn test_advance_never_exceeds_total() {
        let coordinator = FetchCoordinator::new();
        let guard = coordinator.start_operation(1).unwrap();
        guard.advance();
        guard.advance();
        assert_eq!(guard.progress().current, 1);
    }

    #[test]
    fn test_start_while_running_is_busy_and_keeps_state() {
        let coordinator = FetchCoordinator::new();
        let guard = coordinator.start_operation(5).unwrap();
        guard.advance();

        let busy = coordinator.start_operation(10).unwrap_err();
        assert_eq!(busy.0.total, 5);
        assert_eq!(busy.0.current, 1);

        let progress = coordinator.progress();
        assert_eq!(progress.total, 5);
        assert_eq!(progress.current, 1);
        assert!(progress.is_running);
    }

    #[test]
    fn test_drop_releases_slot_and_next_start_resets() {
        let coordinator = FetchCoordinator::new();
        {
            let guard = coordinator.start_operation(2).unwrap();
            guard.advance();
        }
        assert!(!coordinator.progress().is_running);

        let _guard = coordinator.start_operation(7).unwrap();
        assert_eq!(
            coordinator.progress(),
            FetchProgress {
                total: 7,
                current: 0,
                is_running: true
            }
        );
    }

    #[test]
    fn test_clones_share_state() {
        let coordinator = FetchCoordinator::new();
        let other = coordinator.clone();
        let _guard = coordinator.start_operation(1).unwrap();
        assert!(other.start_operation(1).is_err());
        assert!(other.progress().is_running);
    }

    #[test]
    fn test_progress_serializes_with_is_running() {
        let json = serde_json::to_value(FetchProgress {
            total: 4,
            current: 1,
            is_running: true,
        })
        .unwrap();
        assert_eq!(json["total"], 4);
        assert_eq!(json["current"], 1);
        assert_eq!(json["is_running"], true);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_idle() {
        let coordinator = FetchCoordinator::new();
        assert!(coordinator.wait_for_progress_complete(Duration::ZERO).await);
    }

    #[tokio::test]
    async fn test_wait_times_out_while_running() {
        let coordinator = FetchCoordinator::with_poll_interval(Duration::from_millis(10));
        let _guard = coordinator.start_operation(1).unwrap();

        let started = std::time::Instant::now();
        assert!(
            !coordinator
                .wait_for_progress_complete(Duration::from_millis(100))
                .await
        );
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_wait_returns_soon_after_finish() {
        let coordinator = FetchCoordinator::with_poll_interval(Duration::from_millis(20));
        let guard = coordinator.start_operation(1).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            guard.finish();
        });

        let started = std::time::Instant::now();
        assert!(
            coordinator
                .wait_for_progress_complete(Duration::from_secs(5))
                .await
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_start_when_idle_waits_for_running_operation() {
        let coordinator = FetchCoordinator::with_poll_interval(Duration::from_millis(10));
        let guard = coordinator.start_operation(1).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        let next = coordinator
            .start_when_idle(4, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(next.progress().total, 4);
        assert_eq!(next.progress().current, 0);
    }

    #[tokio::test]
    async fn test_start_when_idle_times_out() {
        let coordinator = FetchCoordinator::with_poll_interval(Duration::from_millis(10));
        let _guard = coordinator.start_operation(1).unwrap();

        let result = coordinator
            .start_when_idle(4, Duration::from_millis(50))
            .await;
        assert!(result.is_err());
        assert_eq!(coordinator.progress().total, 1);
    }
}
