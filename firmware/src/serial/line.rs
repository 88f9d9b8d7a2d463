//! Byte-to-line assembly for the command channel.

use core::fmt::Write as _;
use core::str;

use controller_core::protocol::{MAX_STATUS_LINE_LEN, StatusLine};
use heapless::{String, Vec};

/// Maximum number of bytes accepted on a single line (excluding terminator).
pub const MAX_LINE_LEN: usize = 96;

/// Line handed to the controller task, terminator stripped.
pub type InboundLine = String<MAX_LINE_LEN>;

/// Reasons a received line was dropped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum LineError {
    /// More than [`MAX_LINE_LEN`] bytes arrived before a terminator.
    Overflow,
    /// The line was not valid UTF-8.
    InvalidUtf8,
}

/// Accumulates serial bytes until `\r` or `\n`.
#[derive(Default)]
pub struct LineAssembler {
    buffer: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl LineAssembler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Feeds one byte. Returns a result once a non-empty line is terminated.
    pub fn ingest(&mut self, byte: u8) -> Option<Result<InboundLine, LineError>> {
        match byte {
            b'\r' | b'\n' => self.finish(),
            0x08 | 0x7f => {
                self.buffer.pop();
                None
            }
            value => {
                if self.buffer.push(value).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    fn finish(&mut self) -> Option<Result<InboundLine, LineError>> {
        if core::mem::take(&mut self.overflowed) {
            self.buffer.clear();
            return Some(Err(LineError::Overflow));
        }
        if self.buffer.is_empty() {
            return None;
        }

        let result = str::from_utf8(&self.buffer)
            .map_err(|_| LineError::InvalidUtf8)
            .and_then(|text| {
                let mut line = InboundLine::new();
                line.push_str(text).map_err(|_| LineError::Overflow)?;
                Ok(line)
            });
        self.buffer.clear();
        Some(result)
    }
}

/// Wire form of a status line, CRLF terminated.
pub type EncodedStatus = String<{ MAX_STATUS_LINE_LEN + 2 }>;

/// Renders `line` with its CRLF terminator.
///
/// # Errors
///
/// Returns [`core::fmt::Error`] if the rendering does not fit.
pub fn encode_status(line: &StatusLine) -> Result<EncodedStatus, core::fmt::Error> {
    let mut encoded = EncodedStatus::new();
    write!(encoded, "{line}\r\n")?;
    Ok(encoded)
}
