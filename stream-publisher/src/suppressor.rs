//! Rate limiting for repeated failure logs.

use std::sync::atomic::{AtomicU32, Ordering};

/// Number of consecutive failures logged before suppression starts.
pub const DEFAULT_LOG_THRESHOLD: u32 = 2;

/// Tracks a streak of consecutive failures and decides which ones to log.
///
/// The first `threshold` failures of a streak are logged; later ones are only
/// counted. A success ends the streak and re-arms logging.
#[derive(Debug)]
pub struct LogSuppressor {
    threshold: u32,
    streak: AtomicU32,
}

impl Default for LogSuppressor {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_THRESHOLD)
    }
}

impl LogSuppressor {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            streak: AtomicU32::new(0),
        }
    }

    /// Count a failure. Returns whether it should be logged.
    pub fn record_failure(&self) -> bool {
        let previous = self
            .streak
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| Some(s.saturating_add(1)))
            .unwrap_or(u32::MAX);
        previous < self.threshold
    }

    /// End the current streak. Returns how many failures went unlogged in it.
    pub fn record_success(&self) -> u32 {
        self.streak.swap(0, Ordering::SeqCst).saturating_sub(self.threshold)
    }

    /// Length of the current failure streak.
    pub fn streak(&self) -> u32 {
        self.streak.load(Ordering::SeqCst)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_logs_until_threshold() {
        let suppressor = LogSuppressor::default();
        assert!(suppressor.record_failure());
        assert!(suppressor.record_failure());
        assert!(!suppressor.record_failure());
        assert!(!suppressor.record_failure());
        assert_eq!(suppressor.streak(), 4);
    }

    #[test]
    fn test_success_rearms_logging() {
        let suppressor = LogSuppressor::default();
        for _ in 0..5 {
            suppressor.record_failure();
        }
        assert_eq!(suppressor.record_success(), 3);
        assert_eq!(suppressor.streak(), 0);
        assert!(suppressor.record_failure());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 0)]
    #[case(7, 5)]
    fn test_suppressed_count(#[case] failures: u32, #[case] suppressed: u32) {
        let suppressor = LogSuppressor::new(2);
        for _ in 0..failures {
            suppressor.record_failure();
        }
        assert_eq!(suppressor.record_success(), suppressed);
    }

    #[test]
    fn test_zero_threshold_suppresses_everything() {
        let suppressor = LogSuppressor::new(0);
        assert_eq!(suppressor.threshold(), 0);
        assert!(!suppressor.record_failure());
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(LogSuppressor::default().threshold(), DEFAULT_LOG_THRESHOLD);
        assert_eq!(DEFAULT_LOG_THRESHOLD, 2);
    }
}
