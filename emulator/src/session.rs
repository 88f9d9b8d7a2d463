use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use controller_core::clock::MonotonicInstant;
use controller_core::config::ControllerConfig;
use controller_core::controller::{TickReport, TrafficController};
use controller_core::lamps::{ANALOG_FULL_SCALE, LampLevels};
use controller_core::modes::{ALL_TRIGGERS, ModeTrigger, ToggleLatch};
use controller_core::protocol::grammar::{DURATIONS_PREFIX, MODE_PREFIX};
use controller_core::protocol::CommandOutcome;
use controller_core::telemetry::EventId;
use crossterm::style::Stylize;

/// Simulated loop period, matching the firmware ticker.
pub const TICK: Duration = Duration::from_millis(10);

/// Potentiometer position before any `pot` directive.
const DEFAULT_POT: u16 = ANALOG_FULL_SCALE;

/// Longest `wait` accepted in one directive.
const MAX_WAIT_MS: u64 = 600_000;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "TRAFFIC_LIGHT:r:y:g",
        "TRAFFIC_LIGHT:<red>:<yellow>:<green>  - send a duration update over serial",
    ),
    (
        "MODE:name",
        "MODE:<emergency|blink|OFF|normal>    - send a mode command over serial",
    ),
    (
        "press",
        "press <emergency|blink|off>          - latch a button edge",
    ),
    (
        "pot",
        "pot <0-1023>                         - set the potentiometer sample",
    ),
    (
        "wait",
        "wait <ms>                            - advance the simulated clock",
    ),
    (
        "show",
        "show                                 - draw the lamps",
    ),
    (
        "state",
        "state                                - print controller state",
    ),
    (
        "events",
        "events                               - print the telemetry history",
    ),
    (
        "log",
        "log <on|off>                         - echo telemetry while time advances",
    ),
    (
        "telemetry",
        "telemetry <on|off>                   - mute the throttled LED_STATE mirror",
    ),
];

/// Milliseconds since the emulated device powered on.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct SimInstant(u64);

impl SimInstant {
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    fn advanced_by(self, step: Duration) -> Self {
        let millis = u64::try_from(step.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl MonotonicInstant for SimInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Startup options shared by both emulator binaries.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub config: ControllerConfig,
    pub transcript: Option<PathBuf>,
    pub transcript_header: Option<String>,
}

pub struct Session {
    controller: TrafficController<SimInstant>,
    buttons: ToggleLatch,
    serial_rx: VecDeque<String>,
    now: SimInstant,
    pot: u16,
    last_report: Option<TickReport>,
    echo_events: bool,
    last_event: Option<EventId>,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    /// # Errors
    ///
    /// Fails when the transcript file cannot be created.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        let transcript = match options.transcript {
            Some(path) => {
                let header = options
                    .transcript_header
                    .as_deref()
                    .unwrap_or("Traffic light emulator transcript");
                Some(TranscriptLogger::create(&path, header)?)
            }
            None => None,
        };

        Ok(Self {
            controller: TrafficController::new(options.config),
            buttons: ToggleLatch::new(),
            serial_rx: VecDeque::new(),
            now: SimInstant::default(),
            pot: DEFAULT_POT,
            last_report: None,
            echo_events: false,
            last_event: None,
            transcript,
        })
    }

    #[must_use]
    pub fn now(&self) -> SimInstant {
        self.now
    }

    #[must_use]
    pub fn controller(&self) -> &TrafficController<SimInstant> {
        &self.controller
    }

    /// Handles one directive and returns the lines to show the operator.
    ///
    /// # Errors
    ///
    /// Fails when the transcript cannot be written.
    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        self.log(TranscriptRole::Host, trimmed)?;
        let lines = self.dispatch(trimmed);
        for line in &lines {
            self.log(TranscriptRole::Device, line)?;
        }
        Ok(lines)
    }

    fn dispatch(&mut self, directive: &str) -> Vec<String> {
        if directive.starts_with(DURATIONS_PREFIX) || directive.starts_with(MODE_PREFIX) {
            self.serial_rx.push_back(directive.to_string());
            return self.advance(TICK);
        }

        let mut words = directive.split_whitespace();
        let keyword = words.next().unwrap_or_default();
        let argument = words.next();
        if words.next().is_some() {
            return vec![format!("ERR syntax too many arguments for `{keyword}`")];
        }

        match (keyword.to_ascii_lowercase().as_str(), argument) {
            ("press", Some(name)) => match parse_trigger(name) {
                Some(trigger) => {
                    self.buttons.request(trigger);
                    self.advance(TICK)
                }
                None => vec![format!("ERR syntax unknown button `{name}`")],
            },
            ("pot", Some(value)) => match value.parse::<u16>() {
                Ok(sample) if sample <= ANALOG_FULL_SCALE => {
                    self.pot = sample;
                    vec![format!("pot set to {sample}")]
                }
                _ => vec![format!(
                    "ERR syntax pot expects 0-{ANALOG_FULL_SCALE}, got `{value}`"
                )],
            },
            ("wait", Some(value)) => match value.parse::<u64>() {
                Ok(millis) if millis <= MAX_WAIT_MS => self.advance(Duration::from_millis(millis)),
                _ => vec![format!("ERR syntax wait expects 0-{MAX_WAIT_MS} ms, got `{value}`")],
            },
            ("show", None) => vec![self.render_lamps()],
            ("state", None) => self.describe_state(),
            ("events", None) => self.describe_events(),
            ("log", Some(flag)) => match parse_switch(flag) {
                Some(enabled) => {
                    self.echo_events = enabled;
                    self.last_event = self.controller.telemetry().latest().map(|r| r.id);
                    vec![format!("event echo {}", if enabled { "on" } else { "off" })]
                }
                None => vec![format!("ERR syntax log expects on|off, got `{flag}`")],
            },
            ("telemetry", Some(flag)) => match parse_switch(flag) {
                Some(enabled) => {
                    self.controller.set_mirroring(enabled);
                    vec![format!(
                        "LED_STATE mirror {}",
                        if enabled { "on" } else { "muted" }
                    )]
                }
                None => vec![format!("ERR syntax telemetry expects on|off, got `{flag}`")],
            },
            ("help", topic) => help_lines(topic),
            _ => vec![format!("ERR syntax unknown directive `{directive}`")],
        }
    }

    /// Runs the loop for `duration`, one tick per [`TICK`].
    fn advance(&mut self, duration: Duration) -> Vec<String> {
        let steps = duration.as_millis().div_ceil(TICK.as_millis()).max(1);
        let mut output = Vec::new();
        for _ in 0..steps {
            self.tick_once(&mut output);
            self.now = self.now.advanced_by(TICK);
        }
        output
    }

    fn tick_once(&mut self, output: &mut Vec<String>) {
        let now = self.now;
        self.controller.apply_pending(&self.buttons, now);

        let serial = self
            .serial_rx
            .pop_front()
            .map(|line| (self.controller.handle_line(&line, now), line));
        if let Some((CommandOutcome::Ignored(reason), line)) = serial {
            output.push(format!("{} ERR ignored `{line}`: {reason}", stamp(now)));
        }

        self.last_report = Some(self.controller.tick(now, self.pot));
        while let Some(line) = self.controller.pop_line() {
            output.push(format!("{} {}", stamp(now), line));
        }

        if self.echo_events {
            for record in self.controller.telemetry().since(self.last_event) {
                output.push(format!(
                    "{}   event {}",
                    stamp(record.timestamp),
                    record.event
                ));
            }
        }
        self.last_event = self.controller.telemetry().latest().map(|r| r.id);
    }

    fn render_lamps(&self) -> String {
        let levels = self
            .last_report
            .map_or(LampLevels::OFF, |report| report.levels);
        let red = lamp_glyph(levels.red).red();
        let yellow = lamp_glyph(levels.yellow).yellow();
        let green = lamp_glyph(levels.green).green();
        format!(
            "{} [{red}] [{yellow}] [{green}]  R{:>3} Y{:>3} G{:>3}",
            stamp(self.now),
            levels.red,
            levels.yellow,
            levels.green
        )
    }

    fn describe_state(&self) -> Vec<String> {
        let controller = &self.controller;
        let durations = controller.durations();
        vec![
            format!("time       {} ms", self.now.as_millis()),
            format!("mode       {}", controller.mode()),
            format!(
                "phase      {} (flicker {})",
                controller.phase().label(),
                controller.flicker_count()
            ),
            format!(
                "durations  red={}ms yellow={}ms green={}ms",
                durations.red.as_millis(),
                durations.yellow.as_millis(),
                durations.green.as_millis()
            ),
            format!(
                "brightness {} (pot {})",
                controller.brightness(),
                self.pot
            ),
            format!("dropped    {} status lines", controller.dropped_lines()),
        ]
    }

    fn describe_events(&self) -> Vec<String> {
        let telemetry = self.controller.telemetry();
        if telemetry.is_empty() {
            return vec!["no events recorded".to_string()];
        }
        telemetry
            .oldest_first()
            .map(|record| {
                format!(
                    "{} #{:<4} {}",
                    stamp(record.timestamp),
                    record.id,
                    record.event
                )
            })
            .collect()
    }

    fn log(&mut self, role: TranscriptRole, line: &str) -> io::Result<()> {
        let now = self.now;
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(now, role, line),
            None => Ok(()),
        }
    }
}

fn stamp(instant: SimInstant) -> String {
    format!("[{:>7} ms]", instant.as_millis())
}

fn lamp_glyph(level: u8) -> &'static str {
    match level {
        0 => "o",
        1..=127 => "*",
        _ => "@",
    }
}

fn parse_trigger(name: &str) -> Option<ModeTrigger> {
    ALL_TRIGGERS
        .into_iter()
        .find(|trigger| trigger.label().eq_ignore_ascii_case(name))
}

fn parse_switch(flag: &str) -> Option<bool> {
    if flag.eq_ignore_ascii_case("on") {
        Some(true)
    } else if flag.eq_ignore_ascii_case("off") {
        Some(false)
    } else {
        None
    }
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    match topic {
        None => HELP_TOPICS
            .iter()
            .map(|(_, text)| (*text).to_string())
            .chain(std::iter::once("exit | quit                          - leave the emulator".to_string()))
            .collect(),
        Some(topic) => HELP_TOPICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(topic))
            .map_or_else(
                || vec![format!("ERR syntax no help for `{topic}`")],
                |(_, text)| vec![(*text).to_string()],
            ),
    }
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn create(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(
            self.writer,
            "# Timestamps are simulated milliseconds since power-on"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, now: SimInstant, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>7} ms] {} {}",
            now.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TranscriptRole {
    Host,
    Device,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Device => "DEV <",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use controller_core::modes::OverrideMode;
    use controller_core::sequence::SequencePhase;

    fn session() -> Session {
        Session::new(SessionOptions::default()).expect("session without transcript")
    }

    fn run(session: &mut Session, directive: &str) -> Vec<String> {
        session.handle_command(directive).expect("no transcript I/O")
    }

    #[test]
    fn wait_mirrors_led_state_every_hundred_ms() {
        let mut session = session();
        let lines = run(&mut session, "wait 300");

        let led: Vec<&String> = lines.iter().filter(|l| l.contains("LED_STATE")).collect();
        assert_eq!(led.len(), 3);
        assert!(led[0].ends_with("LED_STATE:R1:Y0:G0"));
        assert!(lines.iter().any(|l| l.ends_with("BRIGHTNESS:255")));
        assert_eq!(session.now(), SimInstant::from_millis(300));
    }

    #[test]
    fn serial_and_buttons_share_the_debounce_window() {
        let mut session = session();
        let first = run(&mut session, "press emergency");
        assert!(first.iter().any(|l| l.ends_with("MODE: emergency")));

        let second = run(&mut session, "MODE:blink");
        assert!(!second.iter().any(|l| l.contains("MODE:")));
        assert_eq!(session.controller().mode(), OverrideMode::Emergency);

        run(&mut session, "wait 200");
        let third = run(&mut session, "MODE:blink");
        assert!(third.iter().any(|l| l.ends_with("MODE: blink")));
    }

    #[test]
    fn ignored_serial_lines_are_reported_locally() {
        let mut session = session();
        let lines = run(&mut session, "MODE:party");
        assert!(lines.iter().any(|l| l.contains("ERR ignored `MODE:party`: unknown mode")));
    }

    #[test]
    fn bad_directives_report_syntax_errors() {
        let mut session = session();
        assert!(run(&mut session, "pot 2000")[0].starts_with("ERR syntax"));
        assert!(run(&mut session, "press fire")[0].starts_with("ERR syntax"));
        assert!(run(&mut session, "dance")[0].starts_with("ERR syntax"));
        assert_eq!(session.now(), SimInstant::from_millis(0));
    }

    #[test]
    fn hot_update_moves_the_cycle_along() {
        let mut session = session();
        run(&mut session, "wait 1000");
        run(&mut session, "TRAFFIC_LIGHT:100:100:100");
        run(&mut session, "wait 10");
        assert_eq!(session.controller().phase(), SequencePhase::Yellow1);

        let state = run(&mut session, "state");
        assert!(state.iter().any(|l| l.contains("red=100ms")));
    }

    #[test]
    fn show_reflects_the_potentiometer() {
        let mut session = session();
        run(&mut session, "pot 0");
        run(&mut session, "wait 10");
        assert!(run(&mut session, "show")[0].contains("R  0 Y  0 G  0"));
    }
}
