//! Fixed backoff schedule for the config fetch
//!
//! One entry per attempt: the delay slept after that attempt fails. The
//! default `[0, 2, 4, 8, 16]` gives five attempts.

use std::time::Duration;

/// Default schedule, in seconds
pub const DEFAULT_SCHEDULE_SECS: [u64; 5] = [0, 2, 4, 8, 16];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    delays: Vec<Duration>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_secs(&DEFAULT_SCHEDULE_SECS)
    }
}

impl Backoff {
    /// Build a schedule from delays in seconds
    ///
    /// An empty schedule still allows a single attempt.
    pub fn from_secs(secs: &[u64]) -> Self {
        let delays = if secs.is_empty() {
            vec![Duration::ZERO]
        } else {
            secs.iter().copied().map(Duration::from_secs).collect()
        };
        Self { delays }
    }

    /// Total number of attempts
    pub fn attempts(&self) -> usize {
        self.delays.len()
    }

    /// `(attempt number, delay after failure)` pairs, attempts counted from 1
    pub fn schedule(&self) -> impl Iterator<Item = (usize, Duration)> + '_ {
        self.delays.iter().copied().enumerate().map(|(i, d)| (i + 1, d))
    }
}
