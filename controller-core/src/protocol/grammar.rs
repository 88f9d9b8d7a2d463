//! Parser for inbound serial command lines.
//!
//! Two line shapes are understood:
//!
//! * `TRAFFIC_LIGHT:<red_ms>:<yellow_ms>:<green_ms>`
//! * `MODE:<emergency|blink|OFF|normal>`
//!
//! Anything else parses to [`Command::Unrecognized`]. Rejections never
//! surface on the wire; the reason is kept for telemetry only.

use core::fmt;

use winnow::ModalResult;
use winnow::ascii::dec_uint;
use winnow::combinator::{alt, preceded};
use winnow::prelude::*;

use crate::modes::ModeTrigger;
use crate::sequence::PhaseDurations;

/// Prefix of the phase-duration command.
pub const DURATIONS_PREFIX: &str = "TRAFFIC_LIGHT:";

/// Prefix of the mode-selection command.
pub const MODE_PREFIX: &str = "MODE:";

/// Mode names accepted after `MODE:`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ModeName {
    Emergency,
    Blink,
    Off,
    Normal,
}

impl ModeName {
    /// Toggle trigger equivalent to a button press, or `None` for `normal`.
    #[must_use]
    pub const fn trigger(self) -> Option<ModeTrigger> {
        match self {
            ModeName::Emergency => Some(ModeTrigger::Emergency),
            ModeName::Blink => Some(ModeTrigger::Blink),
            ModeName::Off => Some(ModeTrigger::Off),
            ModeName::Normal => None,
        }
    }
}

/// Why a line was ignored.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnrecognizedReason {
    UnknownPrefix,
    MalformedDurations,
    UnknownMode,
}

impl fmt::Display for UnrecognizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnrecognizedReason::UnknownPrefix => f.write_str("unknown prefix"),
            UnrecognizedReason::MalformedDurations => f.write_str("malformed durations"),
            UnrecognizedReason::UnknownMode => f.write_str("unknown mode"),
        }
    }
}

/// Parsed inbound command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    SetDurations(PhaseDurations),
    SetMode(ModeName),
    Unrecognized(UnrecognizedReason),
}

/// Parses one line. Surrounding ASCII whitespace and line ends are ignored.
#[must_use]
pub fn parse(line: &str) -> Command {
    let line = line.trim_ascii();

    if let Some(fields) = line.strip_prefix(DURATIONS_PREFIX) {
        return durations
            .parse(fields)
            .map_or(
                Command::Unrecognized(UnrecognizedReason::MalformedDurations),
                Command::SetDurations,
            );
    }

    if let Some(name) = line.strip_prefix(MODE_PREFIX) {
        return mode_name
            .parse(name)
            .map_or(
                Command::Unrecognized(UnrecognizedReason::UnknownMode),
                Command::SetMode,
            );
    }

    Command::Unrecognized(UnrecognizedReason::UnknownPrefix)
}

fn durations(input: &mut &str) -> ModalResult<PhaseDurations> {
    let (red, yellow, green) = (
        dec_uint::<_, u32, _>,
        preceded(':', dec_uint::<_, u32, _>),
        preceded(':', dec_uint::<_, u32, _>),
    )
        .parse_next(input)?;
    Ok(PhaseDurations::from_millis(red, yellow, green))
}

fn mode_name(input: &mut &str) -> ModalResult<ModeName> {
    alt((
        "emergency".value(ModeName::Emergency),
        "blink".value(ModeName::Blink),
        "OFF".value(ModeName::Off),
        "normal".value(ModeName::Normal),
    ))
    .parse_next(input)
}
