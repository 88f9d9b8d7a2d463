//! Normal-cycle phase machine.
//!
//! The cycle runs RED, YELLOW, GREEN, a fixed-cadence green flicker and a
//! second YELLOW before wrapping back to RED. Only the three hold durations
//! are configurable; the flicker cadence is a compile-time constant.

use core::time::Duration;

use crate::clock::MonotonicInstant;
use crate::lamps::LightColor;

/// Half-period of the green flicker (seven alternations per second).
pub const FLICKER_HALF_PERIOD: Duration = Duration::from_millis(1000 / 7);

/// Number of flicker sub-ticks before the cycle moves on to the second yellow.
pub const FLICKER_SUB_TICKS: u8 = 7;

/// One state of the normal traffic cycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SequencePhase {
    #[default]
    RedHold,
    Yellow1,
    GreenHold,
    GreenFlicker,
    Yellow2,
}

impl SequencePhase {
    /// Phase that follows `self` in the cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            SequencePhase::RedHold => SequencePhase::Yellow1,
            SequencePhase::Yellow1 => SequencePhase::GreenHold,
            SequencePhase::GreenHold => SequencePhase::GreenFlicker,
            SequencePhase::GreenFlicker => SequencePhase::Yellow2,
            SequencePhase::Yellow2 => SequencePhase::RedHold,
        }
    }

    /// Short label used by telemetry and the emulator.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SequencePhase::RedHold => "red",
            SequencePhase::Yellow1 => "yellow1",
            SequencePhase::GreenHold => "green",
            SequencePhase::GreenFlicker => "flicker",
            SequencePhase::Yellow2 => "yellow2",
        }
    }
}

/// Configurable hold times for the red, yellow and green phases.
///
/// Zero is accepted and yields a phase that lasts a single tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PhaseDurations {
    pub red: Duration,
    pub yellow: Duration,
    pub green: Duration,
}

impl PhaseDurations {
    /// Durations used until the first `TRAFFIC_LIGHT:` command arrives.
    pub const DEFAULT: Self = Self::from_millis(2_000, 500, 2_000);

    #[must_use]
    pub const fn from_millis(red: u32, yellow: u32, green: u32) -> Self {
        Self {
            red: Duration::from_millis(red as u64),
            yellow: Duration::from_millis(yellow as u64),
            green: Duration::from_millis(green as u64),
        }
    }

    /// Time a phase waits before advancing. Flicker advances by sub-tick count.
    #[must_use]
    pub const fn hold_for(&self, phase: SequencePhase) -> Duration {
        match phase {
            SequencePhase::RedHold => self.red,
            SequencePhase::Yellow1 | SequencePhase::Yellow2 => self.yellow,
            SequencePhase::GreenHold => self.green,
            SequencePhase::GreenFlicker => FLICKER_HALF_PERIOD,
        }
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Colour emitted while `phase` is active with the given flicker count.
#[must_use]
pub const fn phase_color(phase: SequencePhase, flicker_count: u8) -> LightColor {
    match phase {
        SequencePhase::RedHold => LightColor::Red,
        SequencePhase::Yellow1 | SequencePhase::Yellow2 => LightColor::Yellow,
        SequencePhase::GreenHold => LightColor::Green,
        SequencePhase::GreenFlicker => {
            if flicker_count % 2 == 0 {
                LightColor::Green
            } else {
                LightColor::Off
            }
        }
    }
}

/// Result of advancing the cycle by one tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SequenceStep {
    /// Colour of the phase in effect when the tick started.
    pub color: LightColor,
    /// Phase entered during this tick, if any.
    pub entered: Option<SequencePhase>,
}

/// Owns the phase, the phase timer and the configured durations.
#[derive(Clone, Debug)]
pub struct SequenceController<I> {
    durations: PhaseDurations,
    phase: SequencePhase,
    phase_started: Option<I>,
    flicker_count: u8,
}

impl<I> SequenceController<I>
where
    I: MonotonicInstant,
{
    /// Creates a controller parked at [`SequencePhase::RedHold`].
    ///
    /// The phase timer starts on the first tick.
    #[must_use]
    pub const fn new(durations: PhaseDurations) -> Self {
        Self {
            durations,
            phase: SequencePhase::RedHold,
            phase_started: None,
            flicker_count: 0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> SequencePhase {
        self.phase
    }

    #[must_use]
    pub const fn flicker_count(&self) -> u8 {
        self.flicker_count
    }

    #[must_use]
    pub const fn durations(&self) -> PhaseDurations {
        self.durations
    }

    /// Instant the current phase (or flicker sub-tick) started.
    #[must_use]
    pub const fn phase_started(&self) -> Option<I> {
        self.phase_started
    }

    /// Replaces the hold durations without touching the phase timer.
    ///
    /// The current phase is re-measured against the new value on the next
    /// tick, which may shorten or extend it.
    pub fn set_durations(&mut self, durations: PhaseDurations) {
        self.durations = durations;
    }

    /// Restarts the cycle at [`SequencePhase::RedHold`] with a fresh timer.
    pub fn reset(&mut self, now: I) {
        self.phase = SequencePhase::RedHold;
        self.phase_started = Some(now);
        self.flicker_count = 0;
    }

    /// Emits the current colour and then evaluates at most one transition.
    pub fn tick(&mut self, now: I) -> SequenceStep {
        let color = phase_color(self.phase, self.flicker_count);
        let started = *self.phase_started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started);

        if elapsed < self.durations.hold_for(self.phase) {
            return SequenceStep {
                color,
                entered: None,
            };
        }

        self.phase_started = Some(now);
        if self.phase == SequencePhase::GreenFlicker {
            self.flicker_count = self.flicker_count.saturating_add(1);
            if self.flicker_count < FLICKER_SUB_TICKS {
                return SequenceStep {
                    color,
                    entered: None,
                };
            }
        }

        self.phase = self.phase.next();
        self.flicker_count = 0;
        SequenceStep {
            color,
            entered: Some(self.phase),
        }
    }
}

impl<I> Default for SequenceController<I>
where
    I: MonotonicInstant,
{
    fn default() -> Self {
        Self::new(PhaseDurations::DEFAULT)
    }
}
