use std::io;
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, SessionOptions};

const TRANSCRIPT_DIR: &str = "transcripts";

#[derive(Clone, Copy, Debug)]
enum Scenario {
    FullCycle,
    ModeToggles,
    HotUpdate,
}

impl Scenario {
    const ALL: [Scenario; 3] = [Scenario::FullCycle, Scenario::ModeToggles, Scenario::HotUpdate];

    fn file_name(self) -> &'static str {
        match self {
            Scenario::FullCycle => "full-cycle.log",
            Scenario::ModeToggles => "mode-toggles.log",
            Scenario::HotUpdate => "hot-update.log",
        }
    }

    fn header(self) -> &'static str {
        match self {
            Scenario::FullCycle => "One full red/yellow/green/flicker/yellow cycle at default timings",
            Scenario::ModeToggles => "Override modes entered from buttons and serial, with debounce",
            Scenario::HotUpdate => "Duration update applied while the red phase is running",
        }
    }

    fn directives(self) -> &'static [&'static str] {
        match self {
            Scenario::FullCycle => &[
                "log on",
                "show",
                "wait 2000",
                "show",
                "wait 500",
                "show",
                "wait 2000",
                "wait 1000",
                "show",
                "wait 600",
                "state",
            ],
            Scenario::ModeToggles => &[
                "log on",
                "wait 300",
                "press emergency",
                "press blink",
                "wait 250",
                "MODE:blink",
                "wait 1100",
                "press off",
                "wait 250",
                "show",
                "press off",
                "wait 250",
                "MODE:normal",
                "MODE:normal",
                "state",
            ],
            Scenario::HotUpdate => &[
                "log on",
                "telemetry off",
                "wait 1000",
                "TRAFFIC_LIGHT:100:100:100",
                "wait 10",
                "state",
                "TRAFFIC_LIGHT:100:-5:100",
                "TRAFFIC_LIGHT:5000:500:5000",
                "telemetry on",
                "pot 512",
                "wait 300",
                "events",
            ],
        }
    }
}

fn main() -> io::Result<()> {
    for scenario in Scenario::ALL {
        record(scenario)?;
    }
    Ok(())
}

fn record(scenario: Scenario) -> io::Result<()> {
    let mut session = Session::new(SessionOptions {
        transcript: Some(PathBuf::from(TRANSCRIPT_DIR).join(scenario.file_name())),
        transcript_header: Some(scenario.header().to_string()),
        ..SessionOptions::default()
    })?;

    for directive in scenario.directives() {
        let _ = session.handle_command(directive)?;
    }
    Ok(())
}
