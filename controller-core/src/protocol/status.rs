//! Outbound status lines.
//!
//! [`StatusLine`] renders the exact wire strings through `core::fmt`, so the
//! firmware, the emulator and tests share one formatter.

use core::fmt::{self, Write as _};

use heapless::String;

use crate::lamps::LightColor;
use crate::modes::OverrideMode;

/// Longest rendered status line (`LED_STATE:R0:Y0:G0` plus headroom).
pub const MAX_STATUS_LINE_LEN: usize = 32;

/// Bounded buffer holding one rendered status line without terminator.
pub type StatusBuffer = String<MAX_STATUS_LINE_LEN>;

/// Which lamps an `LED_STATE` line reports as lit.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LedIndicator {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl LedIndicator {
    /// One-hot mirror of a sequence or override colour.
    ///
    /// [`LightColor::Toggling`] has no one-hot form and reports all lamps dark;
    /// the blink ticker reports through [`LedIndicator::uniform`] instead.
    #[must_use]
    pub const fn from_color(color: LightColor) -> Self {
        Self {
            red: matches!(color, LightColor::Red),
            yellow: matches!(color, LightColor::Yellow),
            green: matches!(color, LightColor::Green),
        }
    }

    /// Every lamp at the same level.
    #[must_use]
    pub const fn uniform(lit: bool) -> Self {
        Self {
            red: lit,
            yellow: lit,
            green: lit,
        }
    }
}

impl fmt::Display for LedIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LED_STATE:R{}:Y{}:G{}",
            u8::from(self.red),
            u8::from(self.yellow),
            u8::from(self.green)
        )
    }
}

/// One outbound line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusLine {
    Mode(OverrideMode),
    LedState(LedIndicator),
    Brightness(u8),
}

impl StatusLine {
    /// Renders the line into a fixed-capacity buffer.
    ///
    /// # Errors
    ///
    /// Returns [`fmt::Error`] if the rendering does not fit.
    pub fn render(&self) -> Result<StatusBuffer, fmt::Error> {
        let mut buffer = StatusBuffer::new();
        write!(buffer, "{self}")?;
        Ok(buffer)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLine::Mode(mode) => write!(f, "MODE: {mode}"),
            StatusLine::LedState(indicator) => write!(f, "{indicator}"),
            StatusLine::Brightness(level) => write!(f, "BRIGHTNESS:{level}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(line: StatusLine) -> StatusBuffer {
        line.render().expect("status line fits")
    }

    #[test]
    fn renders_mode_lines_with_wire_labels() {
        assert_eq!(rendered(StatusLine::Mode(OverrideMode::Off)), "MODE: OFF");
        assert_eq!(
            rendered(StatusLine::Mode(OverrideMode::Normal)),
            "MODE: normal"
        );
        assert_eq!(
            rendered(StatusLine::Mode(OverrideMode::Emergency)),
            "MODE: emergency"
        );
    }

    #[test]
    fn led_state_is_one_hot_for_sequence_colours() {
        let line = StatusLine::LedState(LedIndicator::from_color(LightColor::Yellow));
        assert_eq!(rendered(line), "LED_STATE:R0:Y1:G0");

        let dark = StatusLine::LedState(LedIndicator::from_color(LightColor::Off));
        assert_eq!(rendered(dark), "LED_STATE:R0:Y0:G0");
    }

    #[test]
    fn uniform_indicator_and_brightness() {
        assert_eq!(
            rendered(StatusLine::LedState(LedIndicator::uniform(true))),
            "LED_STATE:R1:Y1:G1"
        );
        assert_eq!(rendered(StatusLine::Brightness(255)), "BRIGHTNESS:255");
    }
}
