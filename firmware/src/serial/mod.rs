//! Serial command channel plumbing.
//!
//! The UART task assembles inbound bytes into lines and hands them to the
//! controller task over [`InboundQueue`]; rendered status lines travel back
//! over [`OutboundQueue`]. Both channels are bounded so a stalled peer can
//! never grow memory use.

pub mod line;

use controller_core::protocol::StatusLine;
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

pub use line::{InboundLine, LineAssembler, LineError, MAX_LINE_LEN, encode_status};

/// Baud rate of the command channel.
pub const SERIAL_BAUD: u32 = 9_600;

/// Complete inbound lines waiting for the controller task.
pub const INBOUND_QUEUE_DEPTH: usize = 2;

/// Status lines waiting for the UART writer.
pub const OUTBOUND_QUEUE_DEPTH: usize = 16;

#[cfg(target_os = "none")]
type SerialMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type SerialMutex = NoopRawMutex;

pub type InboundQueue = Channel<SerialMutex, InboundLine, INBOUND_QUEUE_DEPTH>;
pub type InboundSender<'a> = Sender<'a, SerialMutex, InboundLine, INBOUND_QUEUE_DEPTH>;
pub type InboundReceiver<'a> = Receiver<'a, SerialMutex, InboundLine, INBOUND_QUEUE_DEPTH>;

pub type OutboundQueue = Channel<SerialMutex, StatusLine, OUTBOUND_QUEUE_DEPTH>;
pub type OutboundSender<'a> = Sender<'a, SerialMutex, StatusLine, OUTBOUND_QUEUE_DEPTH>;
pub type OutboundReceiver<'a> = Receiver<'a, SerialMutex, StatusLine, OUTBOUND_QUEUE_DEPTH>;

#[cfg(test)]
mod tests {
    use super::*;
    use controller_core::modes::OverrideMode;

    #[test]
    fn outbound_queue_preserves_order_and_bounds() {
        let queue = OutboundQueue::new();
        let sender = queue.sender();
        let receiver = queue.receiver();

        sender.try_send(StatusLine::Mode(OverrideMode::Blink)).unwrap();
        sender.try_send(StatusLine::Brightness(7)).unwrap();
        assert_eq!(
            receiver.try_receive().ok(),
            Some(StatusLine::Mode(OverrideMode::Blink))
        );
        assert_eq!(receiver.try_receive().ok(), Some(StatusLine::Brightness(7)));

        for _ in 0..OUTBOUND_QUEUE_DEPTH {
            sender.try_send(StatusLine::Brightness(0)).unwrap();
        }
        assert!(sender.try_send(StatusLine::Brightness(0)).is_err());
    }
}
