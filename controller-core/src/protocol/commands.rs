//! Dispatch of parsed serial commands.
//!
//! The dispatcher only knows the [`CommandSink`] seam, so it can be exercised
//! against a mock in isolation from the controller that implements it.

use crate::clock::MonotonicInstant;
use crate::modes::{ModeTrigger, ToggleOutcome};
use crate::sequence::PhaseDurations;

use super::grammar::{self, Command, UnrecognizedReason};

/// Effect of one inbound line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandOutcome {
    DurationsUpdated(PhaseDurations),
    Toggled(ModeTrigger, ToggleOutcome),
    /// `MODE:normal` cleared an active override.
    ReturnedToNormal,
    /// `MODE:normal` arrived while already in Normal mode.
    AlreadyNormal,
    Ignored(UnrecognizedReason),
}

/// Receiver of dispatched commands.
pub trait CommandSink {
    type Instant: MonotonicInstant;

    fn set_durations(&mut self, durations: PhaseDurations, now: Self::Instant);

    fn toggle(&mut self, trigger: ModeTrigger, now: Self::Instant) -> ToggleOutcome;

    /// Clears any override without debouncing. Returns `false` if none was active.
    fn force_normal(&mut self, now: Self::Instant) -> bool;

    /// Notified for lines that were parsed but not acted on.
    fn ignored(&mut self, _reason: UnrecognizedReason, _now: Self::Instant) {}
}

/// Parses `line` and applies it to `sink`.
pub fn execute<S>(line: &str, now: S::Instant, sink: &mut S) -> CommandOutcome
where
    S: CommandSink,
{
    dispatch(grammar::parse(line), now, sink)
}

/// Applies an already parsed command to `sink`.
pub fn dispatch<S>(command: Command, now: S::Instant, sink: &mut S) -> CommandOutcome
where
    S: CommandSink,
{
    match command {
        Command::SetDurations(durations) => {
            sink.set_durations(durations, now);
            CommandOutcome::DurationsUpdated(durations)
        }
        Command::SetMode(name) => match name.trigger() {
            Some(trigger) => CommandOutcome::Toggled(trigger, sink.toggle(trigger, now)),
            None if sink.force_normal(now) => CommandOutcome::ReturnedToNormal,
            None => CommandOutcome::AlreadyNormal,
        },
        Command::Unrecognized(reason) => {
            sink.ignored(reason, now);
            CommandOutcome::Ignored(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::OverrideMode;
    use core::time::Duration;
    use heapless::Vec as HeaplessVec;

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    struct MockInstant(u64);

    impl MonotonicInstant for MockInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    enum Call {
        Durations(PhaseDurations),
        Toggle(ModeTrigger),
        ForceNormal,
        Ignored(UnrecognizedReason),
    }

    #[derive(Default)]
    struct MockSink {
        in_override: bool,
        calls: HeaplessVec<Call, 8>,
    }

    impl CommandSink for MockSink {
        type Instant = MockInstant;

        fn set_durations(&mut self, durations: PhaseDurations, _: MockInstant) {
            self.calls.push(Call::Durations(durations)).unwrap();
        }

        fn toggle(&mut self, trigger: ModeTrigger, _: MockInstant) -> ToggleOutcome {
            self.calls.push(Call::Toggle(trigger)).unwrap();
            self.in_override = true;
            ToggleOutcome::Entered(trigger.mode())
        }

        fn force_normal(&mut self, _: MockInstant) -> bool {
            self.calls.push(Call::ForceNormal).unwrap();
            core::mem::replace(&mut self.in_override, false)
        }

        fn ignored(&mut self, reason: UnrecognizedReason, _: MockInstant) {
            self.calls.push(Call::Ignored(reason)).unwrap();
        }
    }

    #[test]
    fn durations_reach_the_sink() {
        let mut sink = MockSink::default();
        let outcome = execute("TRAFFIC_LIGHT:100:100:100", MockInstant(5), &mut sink);

        let expected = PhaseDurations::from_millis(100, 100, 100);
        assert_eq!(outcome, CommandOutcome::DurationsUpdated(expected));
        assert_eq!(sink.calls.as_slice(), &[Call::Durations(expected)]);
    }

    #[test]
    fn mode_names_map_to_toggles() {
        let mut sink = MockSink::default();
        let outcome = execute("MODE:blink", MockInstant(0), &mut sink);

        assert_eq!(
            outcome,
            CommandOutcome::Toggled(
                ModeTrigger::Blink,
                ToggleOutcome::Entered(OverrideMode::Blink)
            )
        );
    }

    #[test]
    fn normal_reports_whether_an_override_was_cleared() {
        let mut sink = MockSink::default();
        assert_eq!(
            execute("MODE:normal", MockInstant(0), &mut sink),
            CommandOutcome::AlreadyNormal
        );

        execute("MODE:OFF", MockInstant(10), &mut sink);
        assert_eq!(
            execute("MODE:normal", MockInstant(20), &mut sink),
            CommandOutcome::ReturnedToNormal
        );
    }

    #[test]
    fn garbage_is_reported_to_the_sink_only() {
        let mut sink = MockSink::default();
        let outcome = execute("HELLO", MockInstant(0), &mut sink);

        assert_eq!(
            outcome,
            CommandOutcome::Ignored(UnrecognizedReason::UnknownPrefix)
        );
        assert_eq!(
            sink.calls.as_slice(),
            &[Call::Ignored(UnrecognizedReason::UnknownPrefix)]
        );
    }
}
