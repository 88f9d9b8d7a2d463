//! Serial command channel: inbound parsing, dispatch and outbound rendering.

pub mod commands;
pub mod grammar;
pub mod status;

pub use commands::{CommandOutcome, CommandSink, dispatch, execute};
pub use grammar::{Command, ModeName, UnrecognizedReason, parse};
pub use status::{LedIndicator, MAX_STATUS_LINE_LEN, StatusBuffer, StatusLine};
