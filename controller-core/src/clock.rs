//! Monotonic time abstractions shared by firmware and host targets.
//!
//! Every timed component in the core is generic over [`MonotonicInstant`] so
//! the same state machines run against the embassy clock on the MCU, a
//! simulated millisecond clock in the emulator, and mock instants in tests.
//! Timers are level-triggered comparisons against elapsed time, never
//! scheduled callbacks, so re-evaluating them before a threshold is crossed is
//! always harmless.

use core::time::Duration;

/// Monotonic timestamp understood by the control core.
pub trait MonotonicInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Boot-relative instants expressed as a [`Duration`] since power-on.
impl MonotonicInstant for Duration {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        self.saturating_sub(earlier)
    }
}

/// Restartable interval timer polled from the cooperative loop.
///
/// An enabled timer fires on the first poll after [`Periodic::enable`] and
/// then every time one full period has elapsed since it last fired.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Periodic<I> {
    period: Duration,
    last_fired: Option<I>,
    enabled: bool,
}

impl<I> Periodic<I>
where
    I: MonotonicInstant,
{
    /// Creates an enabled timer that fires on its first poll.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            last_fired: None,
            enabled: true,
        }
    }

    /// Creates a timer that stays silent until [`Periodic::enable`] is called.
    #[must_use]
    pub const fn disabled(period: Duration) -> Self {
        Self {
            period,
            last_fired: None,
            enabled: false,
        }
    }

    /// Returns the configured period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Returns `true` while the timer is armed.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Arms the timer; the next poll fires immediately.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.last_fired = None;
    }

    /// Disarms the timer and forgets when it last fired.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.last_fired = None;
    }

    /// Returns `true` when the timer fires at `now`.
    pub fn poll(&mut self, now: I) -> bool {
        if !self.enabled {
            return false;
        }

        let due = match self.last_fired {
            None => true,
            Some(previous) => now.saturating_duration_since(previous) >= self.period,
        };
        if due {
            self.last_fired = Some(now);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn enabled_timer_fires_immediately_then_per_period() {
        let mut timer = Periodic::new(ms(100));
        assert!(timer.poll(ms(5)));
        assert!(!timer.poll(ms(60)));
        assert!(!timer.poll(ms(104)));
        assert!(timer.poll(ms(105)));
        assert!(!timer.poll(ms(105)));
    }

    #[test]
    fn disabled_timer_never_fires_until_enabled() {
        let mut timer = Periodic::disabled(ms(500));
        assert!(!timer.poll(ms(0)));
        assert!(!timer.poll(ms(10_000)));

        timer.enable();
        assert!(timer.is_enabled());
        assert!(timer.poll(ms(10_010)));
        assert!(!timer.poll(ms(10_500)));
        assert!(timer.poll(ms(10_510)));

        timer.disable();
        assert!(!timer.poll(ms(20_000)));
    }

    #[test]
    fn duration_instants_saturate_backwards() {
        assert_eq!(ms(50).saturating_duration_since(ms(80)), Duration::ZERO);
        assert_eq!(ms(80).saturating_duration_since(ms(50)), ms(30));
    }
}
