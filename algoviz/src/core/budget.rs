//! Wall-clock budget for a single execution.

use std::time::{Duration, Instant};

/// Deadline an execution must finish by.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    limit: Duration,
    deadline: Instant,
}

impl Budget {
    pub fn starting_now(limit: Duration) -> Self {
        Self {
            limit,
            deadline: Instant::now() + limit,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Remaining time until the deadline, or `None` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|remaining| !remaining.is_zero())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_none()
    }
}
