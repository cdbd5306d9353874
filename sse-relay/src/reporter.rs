//! Periodic throughput reports.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};

/// One elapsed reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThroughputReport {
    /// Accepted events counted in the window
    pub count: u64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Logs the accepted-event count once per interval and resets it.
///
/// Driven from the supervisor's wait loop; a zero interval disables it.
#[derive(Debug)]
pub struct MetricsReporter {
    interval: Duration,
    started: Instant,
    started_wall: DateTime<Utc>,
}

impl MetricsReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: Instant::now(),
            started_wall: Utc::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Start a fresh window now.
    pub fn reset_window(&mut self) {
        self.started = Instant::now();
        self.started_wall = Utc::now();
    }

    /// Emit a report if the interval has elapsed.
    pub fn tick(&mut self, counter: &AtomicU64) -> Option<ThroughputReport> {
        self.tick_at(Instant::now(), Utc::now(), counter)
    }

    pub(crate) fn tick_at(
        &mut self,
        now: Instant,
        now_wall: DateTime<Utc>,
        counter: &AtomicU64,
    ) -> Option<ThroughputReport> {
        if !self.is_enabled() || now.saturating_duration_since(self.started) < self.interval {
            return None;
        }

        let report = ThroughputReport {
            count: counter.swap(0, Ordering::SeqCst),
            window_start: self.started_wall,
            window_end: now_wall,
        };

        tracing::info!(
            count = report.count,
            "SSE received [{}] events between [{}] and [{}]",
            report.count,
            report.window_start.to_rfc3339_opts(SecondsFormat::Millis, true),
            report.window_end.to_rfc3339_opts(SecondsFormat::Millis, true)
        );

        self.started = now;
        self.started_wall = now_wall;
        Some(report)
    }
}
