use core::time::Duration;

use controller_core::clock::MonotonicInstant;
use controller_core::controller::TrafficController;
use controller_core::lamps::{LightColor, map_brightness};
use controller_core::modes::OverrideMode;
use controller_core::protocol::{CommandOutcome, StatusLine, UnrecognizedReason};
use controller_core::sequence::{PhaseDurations, SequencePhase};
use controller_core::telemetry::TelemetryEventKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MockInstant(u64);

impl MonotonicInstant for MockInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

fn at(ms: u64) -> MockInstant {
    MockInstant(ms)
}

fn run(controller: &mut TrafficController<MockInstant>, from: u64, to: u64) {
    for now in (from..=to).step_by(10) {
        controller.tick(at(now), 1023);
    }
}

#[test]
fn hot_update_truncates_the_current_phase() {
    let mut controller = TrafficController::default();
    run(&mut controller, 0, 1_000);
    assert_eq!(controller.phase(), SequencePhase::RedHold);

    let outcome = controller.handle_line("TRAFFIC_LIGHT:100:100:100", at(1_005));
    assert_eq!(
        outcome,
        CommandOutcome::DurationsUpdated(PhaseDurations::from_millis(100, 100, 100))
    );
    assert_eq!(controller.phase_started(), Some(at(0)));

    let report = controller.tick(at(1_010), 1023);
    assert_eq!(report.color, LightColor::Red);
    assert_eq!(report.entered, Some(SequencePhase::Yellow1));
}

#[test]
fn hot_update_extends_the_current_phase() {
    let mut controller = TrafficController::default();
    run(&mut controller, 0, 1_000);

    controller.handle_line("TRAFFIC_LIGHT:5000:500:2000", at(1_000));
    run(&mut controller, 1_010, 4_990);
    assert_eq!(controller.phase(), SequencePhase::RedHold);

    assert_eq!(
        controller.tick(at(5_000), 1023).entered,
        Some(SequencePhase::Yellow1)
    );
}

#[test]
fn redundant_normal_is_silent_and_keeps_the_timer() {
    let mut controller = TrafficController::default();
    run(&mut controller, 0, 1_500);
    while controller.pop_line().is_some() {}

    assert_eq!(
        controller.handle_line("MODE:normal", at(1_505)),
        CommandOutcome::AlreadyNormal
    );
    assert_eq!(controller.pop_line(), None);
    assert_eq!(controller.phase_started(), Some(at(0)));
    assert_eq!(controller.mode(), OverrideMode::Normal);
}

#[test]
fn malformed_lines_change_nothing() {
    let mut controller = TrafficController::default();
    run(&mut controller, 0, 300);
    let durations = controller.durations();

    for (line, reason) in [
        ("TRAFFIC_LIGHT:1:2", UnrecognizedReason::MalformedDurations),
        ("TRAFFIC_LIGHT:a:b:c", UnrecognizedReason::MalformedDurations),
        ("MODE:party", UnrecognizedReason::UnknownMode),
        ("HELLO", UnrecognizedReason::UnknownPrefix),
    ] {
        assert_eq!(
            controller.handle_line(line, at(305)),
            CommandOutcome::Ignored(reason)
        );
        assert_eq!(
            controller.telemetry().latest().map(|record| record.event),
            Some(TelemetryEventKind::CommandIgnored(reason))
        );
    }

    assert_eq!(controller.durations(), durations);
    assert_eq!(controller.mode(), OverrideMode::Normal);
    assert_eq!(controller.phase_started(), Some(at(0)));
}

#[test]
fn serial_modes_toggle_like_buttons() {
    let mut controller = TrafficController::default();
    controller.handle_line("MODE:emergency\r\n", at(0));
    assert_eq!(controller.mode(), OverrideMode::Emergency);

    controller.handle_line("MODE:emergency", at(300));
    assert_eq!(controller.mode(), OverrideMode::Normal);

    let modes: Vec<StatusLine> = std::iter::from_fn(|| controller.pop_line()).collect();
    assert_eq!(
        modes,
        vec![
            StatusLine::Mode(OverrideMode::Emergency),
            StatusLine::Mode(OverrideMode::Normal),
        ]
    );
}

#[test]
fn brightness_mapping_edges() {
    assert_eq!(map_brightness(0), 0);
    assert_eq!(map_brightness(1023), 255);
    let mid = i32::from(map_brightness(512));
    assert!((mid - 127).abs() <= 2, "{mid}");
}
