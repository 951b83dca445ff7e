use std::time::Duration;

use tokio::time::Instant;

/// Absolute point in time after which an operation gives up.
///
/// Threaded through store and index calls so nested steps draw from one
/// shared budget instead of stacking fresh timeouts. Expiry is reported as
/// a retryable timeout error by the operation that observes it.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Time left before expiry; zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }
}
