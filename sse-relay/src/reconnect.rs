//! Delay applied before reopening a session.

use std::time::Duration;

use rand::Rng;

/// How the supervisor paces reconnect attempts.
///
/// Attempts are never limited in number; the policy only decides how long to
/// wait before each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Reconnect as soon as the previous session is torn down
    #[default]
    Immediate,

    /// Double the delay after every session that failed to open, up to `max`.
    /// A session that opened resets the delay.
    Backoff {
        initial: Duration,
        max: Duration,
        /// Pick the delay uniformly from the upper half of the range
        jitter: bool,
    },
}

impl ReconnectPolicy {
    /// Exponential backoff with jitter.
    pub fn backoff(initial: Duration, max: Duration) -> Self {
        ReconnectPolicy::Backoff {
            initial,
            max,
            jitter: true,
        }
    }

    /// Delay before the next attempt, given how many sessions in a row failed to open.
    pub fn delay_for(&self, consecutive_failures: u32) -> Duration {
        match *self {
            ReconnectPolicy::Immediate => Duration::ZERO,
            ReconnectPolicy::Backoff { .. } if consecutive_failures == 0 => Duration::ZERO,
            ReconnectPolicy::Backoff {
                initial,
                max,
                jitter,
            } => {
                let exponent = (consecutive_failures - 1).min(31);
                let delay = initial.saturating_mul(1u32 << exponent).min(max);
                if jitter {
                    jittered(delay)
                } else {
                    delay
                }
            }
        }
    }
}

fn jittered(delay: Duration) -> Duration {
    let millis = delay.as_millis().min(u64::MAX as u128) as u64;
    if millis < 2 {
        return delay;
    }
    Duration::from_millis(rand::rng().random_range(millis / 2..=millis))
}
