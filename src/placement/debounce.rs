//! Cancel-and-restart debounce timer.
//!
//! Every [`touch`](Debouncer::touch) pushes the deadline out to `now + quiet`.
//! [`poll`](Debouncer::poll) fires once the deadline passes with no further
//! touches, then disarms. Time is always passed in, never read from the
//! clock, so callers (and tests) control it.

use std::time::{Duration, Instant};

/// Quiet period before placement changes are reported.
pub const REPORT_QUIET_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    quiet: Duration,
    changed_at: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(REPORT_QUIET_PERIOD)
    }
}

impl Debouncer {
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            changed_at: None,
        }
    }

    /// Arm, or restart if already armed.
    pub fn touch(&mut self, now: Instant) {
        self.changed_at = Some(now);
    }

    /// True exactly once per quiet window that has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.changed_at {
            Some(changed_at) if now.saturating_duration_since(changed_at) >= self.quiet => {
                self.changed_at = None;
                true
            }
            _ => false,
        }
    }
}
