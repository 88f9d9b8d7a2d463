//! Telemetry event catalog and ring recorder shared by firmware and host targets.
//!
//! The controller records every phase transition, accepted or debounced
//! toggle, duration change and ignored command into a fixed-size history so
//! diagnostics front-ends (defmt on the MCU, the emulator `events` directive)
//! can replay what happened without any allocation.

use core::fmt;
use core::time::Duration;

use heapless::HistoryBuf;

use crate::clock::MonotonicInstant;
use crate::modes::{ModeTrigger, OverrideMode};
use crate::protocol::UnrecognizedReason;
use crate::sequence::{PhaseDurations, SequencePhase};

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Sequential identifier assigned to each record.
pub type EventId = u32;

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    PhaseEntered(SequencePhase),
    ModeEntered(OverrideMode),
    ToggleDebounced(ModeTrigger),
    DurationsUpdated(PhaseDurations),
    CommandIgnored(UnrecognizedReason),
    OutboxOverflow,
}

impl TelemetryEventKind {
    /// `true` for events worth surfacing as warnings.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            TelemetryEventKind::CommandIgnored(_) | TelemetryEventKind::OutboxOverflow
        )
    }
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::PhaseEntered(phase) => write!(f, "phase {}", phase.label()),
            TelemetryEventKind::ModeEntered(mode) => write!(f, "mode {mode}"),
            TelemetryEventKind::ToggleDebounced(trigger) => write!(f, "debounced {trigger}"),
            TelemetryEventKind::DurationsUpdated(durations) => write!(
                f,
                "durations red={}ms yellow={}ms green={}ms",
                durations.red.as_millis(),
                durations.yellow.as_millis(),
                durations.green.as_millis()
            ),
            TelemetryEventKind::CommandIgnored(reason) => write!(f, "ignored {reason}"),
            TelemetryEventKind::OutboxOverflow => f.write_str("outbox-overflow"),
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<I> {
    pub id: EventId,
    pub timestamp: I,
    pub event: TelemetryEventKind,
    /// Time since the previous record, if any.
    pub since_previous: Option<Duration>,
}

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryRecorder<I, const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord<I>, CAPACITY>,
    next_event_id: EventId,
}

impl<I, const CAPACITY: usize> TelemetryRecorder<I, CAPACITY>
where
    I: MonotonicInstant,
{
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records an event and returns its id.
    pub fn record(&mut self, event: TelemetryEventKind, timestamp: I) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        let since_previous = self
            .ring
            .recent()
            .map(|previous| timestamp.saturating_duration_since(previous.timestamp));

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
            since_previous,
        });

        id
    }

    /// Returns the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TelemetryRecord<I>> {
        self.ring.oldest_ordered()
    }

    /// Returns the records written after `id`, oldest first.
    pub fn since(&self, id: Option<EventId>) -> impl Iterator<Item = &TelemetryRecord<I>> {
        self.oldest_first()
            .filter(move |record| id.is_none_or(|seen| record.id > seen))
    }

    /// Returns the most recent telemetry record, if available.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord<I>> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no telemetry records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<I, const CAPACITY: usize> Default for TelemetryRecorder<I, CAPACITY>
where
    I: MonotonicInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    struct MillisInstant(u64);

    impl MonotonicInstant for MillisInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }
    }

    #[test]
    fn records_elapsed_between_events() {
        let mut recorder = TelemetryRecorder::<MillisInstant>::new();

        let id1 = recorder.record(
            TelemetryEventKind::PhaseEntered(SequencePhase::Yellow1),
            MillisInstant(2_000),
        );
        assert_eq!(id1, 0);
        assert_eq!(recorder.latest().map(|r| r.since_previous), Some(None));

        let id2 = recorder.record(
            TelemetryEventKind::PhaseEntered(SequencePhase::GreenHold),
            MillisInstant(2_500),
        );
        assert_eq!(id2, 1);

        let second = recorder.latest().copied().unwrap();
        assert_eq!(second.since_previous, Some(Duration::from_millis(500)));
    }

    #[test]
    fn ring_keeps_only_the_newest_records() {
        let mut recorder = TelemetryRecorder::<MillisInstant, 4>::new();
        for tick in 0..10 {
            recorder.record(TelemetryEventKind::OutboxOverflow, MillisInstant(tick));
        }

        assert_eq!(recorder.len(), 4);
        let ids: heapless::Vec<EventId, 4> = recorder.oldest_first().map(|r| r.id).collect();
        assert_eq!(ids.as_slice(), &[6, 7, 8, 9]);

        let newer: heapless::Vec<EventId, 4> = recorder.since(Some(7)).map(|r| r.id).collect();
        assert_eq!(newer.as_slice(), &[8, 9]);
    }

    #[test]
    fn display_is_compact() {
        let mut text: heapless::String<64> = heapless::String::new();
        core::fmt::Write::write_fmt(
            &mut text,
            format_args!(
                "{}",
                TelemetryEventKind::DurationsUpdated(PhaseDurations::from_millis(100, 50, 100))
            ),
        )
        .unwrap();
        assert_eq!(text, "durations red=100ms yellow=50ms green=100ms");
        assert!(TelemetryEventKind::CommandIgnored(UnrecognizedReason::UnknownMode).is_warning());
    }
}
