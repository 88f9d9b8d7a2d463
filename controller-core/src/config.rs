//! Startup configuration for the controller.
//!
//! Nothing here is persisted. The firmware uses the defaults, the emulator
//! may override the initial durations and debounce window from its command
//! line, and `TRAFFIC_LIGHT:` updates the durations at runtime.

use core::time::Duration;

use crate::debounce::DEBOUNCE_WINDOW;
use crate::sequence::PhaseDurations;

/// Period of the blink ticker while Blink mode is active.
pub const BLINK_PERIOD: Duration = Duration::from_millis(500);

/// Minimum spacing between two throttled `LED_STATE` mirror lines.
pub const TELEMETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Values the controller is constructed with.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    pub durations: PhaseDurations,
    pub debounce_window: Duration,
    pub blink_period: Duration,
    pub telemetry_interval: Duration,
}

impl ControllerConfig {
    pub const DEFAULT: Self = Self {
        durations: PhaseDurations::DEFAULT,
        debounce_window: DEBOUNCE_WINDOW,
        blink_period: BLINK_PERIOD,
        telemetry_interval: TELEMETRY_INTERVAL,
    };

    /// Returns a copy with different initial durations.
    #[must_use]
    pub const fn with_durations(mut self, durations: PhaseDurations) -> Self {
        self.durations = durations;
        self
    }

    /// Returns a copy with a different debounce window.
    #[must_use]
    pub const fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
