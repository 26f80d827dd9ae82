//! Fixed backoff schedule

use std::time::Duration;

/// Ordered waits applied to successive retries of one logical request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    waits: Vec<Duration>,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::new(vec![
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(16),
        ])
    }
}

impl BackoffSchedule {
    /// Schedule with the given waits between attempts
    pub fn new(waits: Vec<Duration>) -> Self {
        Self { waits }
    }

    /// Schedule with no retries
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    /// Number of retries
    pub fn len(&self) -> usize {
        self.waits.len()
    }

    /// Whether the schedule allows no retries
    pub fn is_empty(&self) -> bool {
        self.waits.is_empty()
    }

    /// Upper bound on send attempts per logical request
    pub fn max_attempts(&self) -> usize {
        1 + self.waits.len()
    }

    /// Waits in order
    pub fn iter(&self) -> impl Iterator<Item = Duration> + '_ {
        self.waits.iter().copied()
    }

    /// Sum of all waits
    pub fn total(&self) -> Duration {
        self.waits.iter().sum()
    }
}
