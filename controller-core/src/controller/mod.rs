//! Owned controller context driven by the cooperative loop.
//!
//! [`TrafficController`] composes the phase machine, the mode arbiter, the
//! brightness mapping, the telemetry throttle and the outbound line queue
//! into one value. Platforms construct it once at startup and then call, per
//! loop iteration:
//!
//! 1. [`TrafficController::apply_pending`] with the interrupt-fed latch,
//! 2. [`TrafficController::handle_line`] for at most one complete serial line,
//! 3. [`TrafficController::tick`] with the current potentiometer sample,
//! 4. [`TrafficController::pop_line`] until the outbox is empty.

use core::fmt;

use heapless::Deque;

use crate::clock::{MonotonicInstant, Periodic};
use crate::config::ControllerConfig;
use crate::lamps::{LampDriver, LampLevels, LightColor, map_brightness};
use crate::modes::{
    ModeArbiter, ModeFlags, ModeTrigger, OverrideMode, ToggleLatch, ToggleOutcome,
};
use crate::protocol::{
    self, CommandOutcome, CommandSink, LedIndicator, StatusLine, UnrecognizedReason,
};
use crate::sequence::{PhaseDurations, SequenceController, SequencePhase};
use crate::telemetry::{TelemetryEventKind, TelemetryRecorder};

/// Outbound lines buffered between two drains of the outbox.
pub const OUTBOX_CAPACITY: usize = 16;

/// Failure to queue an outbound line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutboxError {
    Full,
}

impl fmt::Display for OutboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboxError::Full => f.write_str("status outbox full"),
        }
    }
}

/// Everything one loop iteration produced for the output stage.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickReport {
    pub color: LightColor,
    pub brightness: u8,
    pub levels: LampLevels,
    /// Phase entered during this tick, if the cycle advanced.
    pub entered: Option<SequencePhase>,
}

/// The single owned context of the running rig.
pub struct TrafficController<I> {
    config: ControllerConfig,
    sequence: SequenceController<I>,
    modes: ModeArbiter<I>,
    mirror: Periodic<I>,
    telemetry: TelemetryRecorder<I>,
    outbox: Deque<StatusLine, OUTBOX_CAPACITY>,
    dropped_lines: u32,
    brightness: u8,
    color: LightColor,
}

impl<I> TrafficController<I>
where
    I: MonotonicInstant,
{
    #[must_use]
    pub const fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            sequence: SequenceController::new(config.durations),
            modes: ModeArbiter::new(config.debounce_window, config.blink_period),
            mirror: Periodic::new(config.telemetry_interval),
            telemetry: TelemetryRecorder::new(),
            outbox: Deque::new(),
            dropped_lines: 0,
            brightness: 0,
            color: LightColor::Off,
        }
    }

    /// Parses and applies one inbound serial line.
    pub fn handle_line(&mut self, line: &str, now: I) -> CommandOutcome {
        protocol::execute(line, now, self)
    }

    /// Applies a debounced toggle from any source.
    pub fn request_toggle(&mut self, trigger: ModeTrigger, now: I) -> ToggleOutcome {
        let outcome = self
            .modes
            .request_toggle(trigger, now, &mut self.sequence);

        match outcome.announced() {
            Some(mode) => self.announce_mode(mode, now),
            None => {
                self.telemetry
                    .record(TelemetryEventKind::ToggleDebounced(trigger), now);
            }
        }
        outcome
    }

    /// Drains the interrupt latch and applies each trigger in tie-break order.
    ///
    /// Returns how many toggles took effect.
    pub fn apply_pending(&mut self, latch: &ToggleLatch, now: I) -> usize {
        latch
            .take()
            .map(|trigger| self.request_toggle(trigger, now))
            .filter(|outcome| *outcome != ToggleOutcome::Debounced)
            .count()
    }

    /// Runs one loop iteration and returns the lamp intensities to drive.
    pub fn tick(&mut self, now: I, raw_sample: u16) -> TickReport {
        let brightness = map_brightness(raw_sample);
        let step = self.modes.resolve(now, &mut self.sequence);
        if let Some(phase) = step.entered {
            self.telemetry
                .record(TelemetryEventKind::PhaseEntered(phase), now);
        }

        if let Some(lit) = self.modes.poll_blink(now) {
            self.emit_led_state(LedIndicator::uniform(lit), brightness, now);
        }

        if self.modes.active_mode() != OverrideMode::Blink && self.mirror.poll(now) {
            self.emit_led_state(LedIndicator::from_color(step.color), brightness, now);
        }

        self.brightness = brightness;
        self.color = step.color;
        TickReport {
            color: step.color,
            brightness,
            levels: LampLevels::resolve(step.color, brightness, self.modes.blink_lit()),
            entered: step.entered,
        }
    }

    /// Runs [`TrafficController::tick`] and pushes the result through `driver`.
    pub fn drive<D>(&mut self, now: I, raw_sample: u16, driver: &mut D) -> TickReport
    where
        D: LampDriver,
    {
        let report = self.tick(now, raw_sample);
        driver.apply(report.levels);
        report
    }

    /// Pops the oldest queued outbound line.
    pub fn pop_line(&mut self) -> Option<StatusLine> {
        self.outbox.pop_front()
    }

    /// Enables or mutes the throttled `LED_STATE` mirror.
    pub fn set_mirroring(&mut self, enabled: bool) {
        if enabled {
            self.mirror.enable();
        } else {
            self.mirror.disable();
        }
    }

    /// Queues an outbound line.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Full`] when the outbox has not been drained.
    pub fn try_emit(&mut self, line: StatusLine) -> Result<(), OutboxError> {
        self.outbox.push_back(line).map_err(|_| OutboxError::Full)
    }

    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub const fn mode(&self) -> OverrideMode {
        self.modes.active_mode()
    }

    #[must_use]
    pub const fn flags(&self) -> ModeFlags {
        self.modes.flags()
    }

    #[must_use]
    pub const fn phase(&self) -> SequencePhase {
        self.sequence.phase()
    }

    #[must_use]
    pub const fn flicker_count(&self) -> u8 {
        self.sequence.flicker_count()
    }

    #[must_use]
    pub const fn phase_started(&self) -> Option<I> {
        self.sequence.phase_started()
    }

    #[must_use]
    pub const fn durations(&self) -> PhaseDurations {
        self.sequence.durations()
    }

    /// Brightness applied on the most recent tick.
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Colour resolved on the most recent tick.
    #[must_use]
    pub const fn color(&self) -> LightColor {
        self.color
    }

    #[must_use]
    pub const fn blink_lit(&self) -> bool {
        self.modes.blink_lit()
    }

    #[must_use]
    pub const fn telemetry(&self) -> &TelemetryRecorder<I> {
        &self.telemetry
    }

    /// Lines discarded because the outbox was full.
    #[must_use]
    pub const fn dropped_lines(&self) -> u32 {
        self.dropped_lines
    }

    #[must_use]
    pub fn pending_lines(&self) -> usize {
        self.outbox.len()
    }

    fn announce_mode(&mut self, mode: OverrideMode, now: I) {
        self.telemetry
            .record(TelemetryEventKind::ModeEntered(mode), now);
        self.emit(StatusLine::Mode(mode), now);
    }

    fn emit_led_state(&mut self, indicator: LedIndicator, brightness: u8, now: I) {
        self.emit(StatusLine::LedState(indicator), now);
        self.emit(StatusLine::Brightness(brightness), now);
    }

    fn emit(&mut self, line: StatusLine, now: I) {
        if self.try_emit(line).is_err() {
            self.dropped_lines = self.dropped_lines.saturating_add(1);
            self.telemetry
                .record(TelemetryEventKind::OutboxOverflow, now);
        }
    }
}

impl<I> Default for TrafficController<I>
where
    I: MonotonicInstant,
{
    fn default() -> Self {
        Self::new(ControllerConfig::DEFAULT)
    }
}

impl<I> CommandSink for TrafficController<I>
where
    I: MonotonicInstant,
{
    type Instant = I;

    fn set_durations(&mut self, durations: PhaseDurations, now: I) {
        self.sequence.set_durations(durations);
        self.telemetry
            .record(TelemetryEventKind::DurationsUpdated(durations), now);
    }

    fn toggle(&mut self, trigger: ModeTrigger, now: I) -> ToggleOutcome {
        self.request_toggle(trigger, now)
    }

    fn force_normal(&mut self, now: I) -> bool {
        let cleared = self.modes.force_normal(now, &mut self.sequence);
        if cleared {
            self.announce_mode(OverrideMode::Normal, now);
        }
        cleared
    }

    fn ignored(&mut self, reason: UnrecognizedReason, now: I) {
        self.telemetry
            .record(TelemetryEventKind::CommandIgnored(reason), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn first_tick_mirrors_red_at_full_brightness() {
        let mut controller = TrafficController::<Duration>::default();
        let report = controller.tick(ms(0), 1023);

        assert_eq!(report.color, LightColor::Red);
        assert_eq!(report.levels.red, 255);
        assert_eq!(
            controller.pop_line(),
            Some(StatusLine::LedState(LedIndicator::from_color(LightColor::Red)))
        );
        assert_eq!(controller.pop_line(), Some(StatusLine::Brightness(255)));
        assert_eq!(controller.pop_line(), None);
    }

    #[test]
    fn overflow_is_counted_not_fatal() {
        let mut controller = TrafficController::<Duration>::default();
        for step in 0..20 {
            controller.tick(ms(step * 100), 0);
        }

        assert_eq!(controller.pending_lines(), OUTBOX_CAPACITY);
        assert!(controller.dropped_lines() > 0);
        assert_eq!(
            controller.telemetry().latest().map(|r| r.event),
            Some(TelemetryEventKind::OutboxOverflow)
        );
    }

    #[test]
    fn muted_mirror_only_emits_mode_lines() {
        let mut controller = TrafficController::<Duration>::default();
        controller.set_mirroring(false);
        controller.tick(ms(0), 512);
        controller.request_toggle(ModeTrigger::Off, ms(5));
        controller.tick(ms(10), 512);

        assert_eq!(
            controller.pop_line(),
            Some(StatusLine::Mode(OverrideMode::Off))
        );
        assert_eq!(controller.pop_line(), None);
    }
}
