//! Global edge debouncer for mode toggles.
//!
//! One timestamp guards every trigger source: the buttons and the serial
//! `MODE:` toggles all share the same refractory window, so presses on
//! different buttons inside one window collapse to a single accepted edge.

use core::time::Duration;

use crate::clock::MonotonicInstant;

/// Minimum spacing between two accepted toggle edges.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Shared "last accepted edge" gate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Debouncer<I> {
    window: Duration,
    last_accepted: Option<I>,
}

impl<I> Debouncer<I>
where
    I: MonotonicInstant,
{
    /// Creates a debouncer that has not accepted any edge yet.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Returns the configured refractory window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Returns when the last edge was accepted.
    #[must_use]
    pub const fn last_accepted(&self) -> Option<I> {
        self.last_accepted
    }

    /// Accepts the edge at `now` unless it falls inside the window.
    ///
    /// A rejected edge leaves the stored timestamp untouched.
    pub fn accept(&mut self, now: I) -> bool {
        if let Some(previous) = self.last_accepted
            && now.saturating_duration_since(previous) < self.window
        {
            return false;
        }

        self.last_accepted = Some(now);
        true
    }
}

impl<I> Default for Debouncer<I>
where
    I: MonotonicInstant,
{
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn first_edge_is_always_accepted() {
        let mut debouncer = Debouncer::new(DEBOUNCE_WINDOW);
        assert!(debouncer.accept(ms(0)));
        assert_eq!(debouncer.last_accepted(), Some(ms(0)));
    }

    #[test]
    fn edges_inside_the_window_are_rejected_without_moving_it() {
        let mut debouncer = Debouncer::new(DEBOUNCE_WINDOW);
        assert!(debouncer.accept(ms(1_000)));
        assert!(!debouncer.accept(ms(1_050)));
        assert!(!debouncer.accept(ms(1_199)));
        assert_eq!(debouncer.last_accepted(), Some(ms(1_000)));
        assert!(debouncer.accept(ms(1_200)));
    }
}
