use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Receives unit-of-work completion and answers cooperative cancellation.
///
/// Called concurrently from the matcher's worker threads.
pub trait ProgressSink: Sync {
    /// Start a new phase of `total` units.
    fn restart(&self, total: usize, label: &str);

    fn increment(&self, units: usize);

    fn is_cancelled(&self) -> bool;
}

/// Sink that reports nothing and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn restart(&self, _total: usize, _label: &str) {}

    fn increment(&self, _units: usize) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Progress counter that logs every tenth of the current phase.
#[derive(Debug, Default)]
pub struct MatchingProgress {
    done: AtomicUsize,
    total: AtomicUsize,
    label: Mutex<String>,
    token: CancellationToken,
}

impl MatchingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress cancelled through `token`.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Units completed in the current phase.
    pub fn count(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    pub fn label(&self) -> String {
        self.label.lock().clone()
    }
}

impl ProgressSink for MatchingProgress {
    fn restart(&self, total: usize, label: &str) {
        *self.label.lock() = label.to_string();
        self.total.store(total, Ordering::Release);
        self.done.store(0, Ordering::Release);
    }

    fn increment(&self, units: usize) {
        if units == 0 {
            return;
        }
        let before = self.done.fetch_add(units, Ordering::AcqRel);
        let after = before + units;
        let total = self.total();
        if total > 0 && before * 10 / total != after * 10 / total {
            info!(
                "{}: {}/{} ({}%)",
                self.label.lock(),
                after,
                total,
                after.min(total) * 100 / total
            );
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_restart() {
        let progress = MatchingProgress::new();
        progress.restart(4, "matching");
        progress.increment(1);
        progress.increment(2);
        assert_eq!(progress.count(), 3);
        assert_eq!(progress.total(), 4);
        assert_eq!(progress.label(), "matching");

        progress.restart(2, "again");
        assert_eq!(progress.count(), 0);
    }

    #[test]
    fn test_token_is_shared() {
        let token = CancellationToken::new();
        let progress = MatchingProgress::with_token(token.clone());
        assert!(!progress.is_cancelled());
        token.cancel();
        assert!(progress.is_cancelled());
        assert!(progress.token().is_cancelled());
    }

    #[test]
    fn test_concurrent_increments() {
        let progress = MatchingProgress::new();
        progress.restart(800, "threads");
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        progress.increment(1);
                    }
                });
            }
        });
        assert_eq!(progress.count(), 800);
    }
}
