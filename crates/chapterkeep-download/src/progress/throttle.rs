//! Progress throttling.
//!
//! Fetch adapters may report progress on every received chunk; consumers
//! only need a few updates per second.

use std::time::{Duration, Instant};

/// Rate-limiter for per-item progress events.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a throttle with the given minimum spacing between events.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// A throttle that lets every update through.
    #[must_use]
    pub const fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Whether an update may be emitted now.
    pub fn should_emit(&mut self) -> bool {
        self.should_emit_at(Instant::now())
    }

    /// Whether an update may be emitted at `now`. Records `now` on success.
    pub fn should_emit_at(&mut self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
