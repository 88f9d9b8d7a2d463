//! Interrupt-to-loop handoff for button edges.
//!
//! Interrupt handlers only set bits here. The control loop drains the word
//! once per tick and feeds each pending trigger through the arbiter, so all
//! mode mutation runs on one execution context.

use portable_atomic::{AtomicU8, Ordering};

use super::{ALL_TRIGGERS, ModeTrigger};

const fn trigger_bit(trigger: ModeTrigger) -> u8 {
    match trigger {
        ModeTrigger::Emergency => 0b001,
        ModeTrigger::Blink => 0b010,
        ModeTrigger::Off => 0b100,
    }
}

/// Lock-free set of toggle requests awaiting the control loop.
#[derive(Debug, Default)]
pub struct ToggleLatch {
    pending: AtomicU8,
}

impl ToggleLatch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicU8::new(0),
        }
    }

    /// Latches an edge for `trigger`. Safe to call from interrupt context.
    pub fn request(&self, trigger: ModeTrigger) {
        self.pending.fetch_or(trigger_bit(trigger), Ordering::AcqRel);
    }

    /// Returns `true` when at least one edge is waiting.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire) != 0
    }

    /// Clears the latch and yields the drained triggers in tie-break order.
    pub fn take(&self) -> PendingToggles {
        PendingToggles {
            bits: self.pending.swap(0, Ordering::AcqRel),
            cursor: 0,
        }
    }
}

/// Triggers drained from a [`ToggleLatch`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PendingToggles {
    bits: u8,
    cursor: usize,
}

impl Iterator for PendingToggles {
    type Item = ModeTrigger;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(trigger) = ALL_TRIGGERS.get(self.cursor).copied() {
            self.cursor += 1;
            if self.bits & trigger_bit(trigger) != 0 {
                return Some(trigger);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_priority_order_and_clears() {
        let latch = ToggleLatch::new();
        latch.request(ModeTrigger::Off);
        latch.request(ModeTrigger::Emergency);
        latch.request(ModeTrigger::Off);
        assert!(latch.is_pending());

        let mut drained = latch.take();
        assert_eq!(drained.next(), Some(ModeTrigger::Emergency));
        assert_eq!(drained.next(), Some(ModeTrigger::Off));
        assert_eq!(drained.next(), None);
        assert!(!latch.is_pending());
        assert_eq!(latch.take().next(), None);
    }
}
