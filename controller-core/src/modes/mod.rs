//! Override mode arbitration.
//!
//! Emergency, Blink and Off are edge-triggered overlays on top of the normal
//! cycle. The arbiter stores the active overlay as a single [`OverrideMode`],
//! so two overlays can never be active at once. Every toggle passes through
//! the shared [`Debouncer`]; only the serial `MODE:normal` path skips it.

use core::fmt;
use core::time::Duration;

use crate::clock::{MonotonicInstant, Periodic};
use crate::debounce::Debouncer;
use crate::lamps::LightColor;
use crate::sequence::{SequenceController, SequenceStep};

pub mod latch;

pub use latch::{PendingToggles, ToggleLatch};

/// Effective operating mode of the rig.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OverrideMode {
    #[default]
    Normal,
    Emergency,
    Blink,
    Off,
}

impl OverrideMode {
    /// Wire label used in `MODE:` status lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            OverrideMode::Normal => "normal",
            OverrideMode::Emergency => "emergency",
            OverrideMode::Blink => "blink",
            OverrideMode::Off => "OFF",
        }
    }

    #[must_use]
    pub const fn is_override(self) -> bool {
        !matches!(self, OverrideMode::Normal)
    }
}

impl fmt::Display for OverrideMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Source-agnostic toggle request for one of the override modes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ModeTrigger {
    Emergency,
    Blink,
    Off,
}

/// Triggers in tie-break order.
pub const ALL_TRIGGERS: [ModeTrigger; 3] =
    [ModeTrigger::Emergency, ModeTrigger::Blink, ModeTrigger::Off];

impl ModeTrigger {
    /// Mode entered when this trigger toggles its flag on.
    #[must_use]
    pub const fn mode(self) -> OverrideMode {
        match self {
            ModeTrigger::Emergency => OverrideMode::Emergency,
            ModeTrigger::Blink => OverrideMode::Blink,
            ModeTrigger::Off => OverrideMode::Off,
        }
    }

    /// Button name, as used by the emulator and diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ModeTrigger::Emergency => "emergency",
            ModeTrigger::Blink => "blink",
            ModeTrigger::Off => "off",
        }
    }
}

impl fmt::Display for ModeTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-mode view of the arbiter state.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ModeFlags {
    pub emergency: bool,
    pub blink: bool,
    pub off: bool,
}

impl ModeFlags {
    /// Number of override flags currently raised.
    #[must_use]
    pub fn raised(self) -> usize {
        [self.emergency, self.blink, self.off]
            .into_iter()
            .filter(|flag| *flag)
            .count()
    }
}

/// Result of a toggle request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ToggleOutcome {
    /// The trigger raised its flag; the arbiter is now in this mode.
    Entered(OverrideMode),
    /// The trigger lowered its flag; the rig is back in Normal mode.
    Exited,
    /// The request fell inside the debounce window and was ignored.
    Debounced,
}

impl ToggleOutcome {
    /// Mode that must be announced on the wire, if the toggle took effect.
    #[must_use]
    pub const fn announced(self) -> Option<OverrideMode> {
        match self {
            ToggleOutcome::Entered(mode) => Some(mode),
            ToggleOutcome::Exited => Some(OverrideMode::Normal),
            ToggleOutcome::Debounced => None,
        }
    }
}

/// Owns the active override, the debounce gate and the blink ticker.
#[derive(Clone, Debug)]
pub struct ModeArbiter<I> {
    active: OverrideMode,
    debouncer: Debouncer<I>,
    blink: Periodic<I>,
    blink_lit: bool,
}

impl<I> ModeArbiter<I>
where
    I: MonotonicInstant,
{
    #[must_use]
    pub const fn new(debounce_window: Duration, blink_period: Duration) -> Self {
        Self {
            active: OverrideMode::Normal,
            debouncer: Debouncer::new(debounce_window),
            blink: Periodic::disabled(blink_period),
            blink_lit: false,
        }
    }

    #[must_use]
    pub const fn active_mode(&self) -> OverrideMode {
        self.active
    }

    #[must_use]
    pub const fn flags(&self) -> ModeFlags {
        ModeFlags {
            emergency: matches!(self.active, OverrideMode::Emergency),
            blink: matches!(self.active, OverrideMode::Blink),
            off: matches!(self.active, OverrideMode::Off),
        }
    }

    /// Current level of the blink ticker output.
    #[must_use]
    pub const fn blink_lit(&self) -> bool {
        self.blink_lit
    }

    #[must_use]
    pub const fn blink_enabled(&self) -> bool {
        self.blink.is_enabled()
    }

    /// Applies a debounced toggle for `trigger`.
    ///
    /// Raising a flag lowers the other two. Lowering a flag returns to Normal
    /// and restarts the cycle at red.
    pub fn request_toggle(
        &mut self,
        trigger: ModeTrigger,
        now: I,
        sequence: &mut SequenceController<I>,
    ) -> ToggleOutcome {
        if !self.debouncer.accept(now) {
            return ToggleOutcome::Debounced;
        }

        let target = trigger.mode();
        if self.active == target {
            self.exit_override(now, sequence);
            return ToggleOutcome::Exited;
        }

        self.active = target;
        self.blink_lit = false;
        if target == OverrideMode::Blink {
            self.blink.enable();
        } else {
            self.blink.disable();
        }
        ToggleOutcome::Entered(target)
    }

    /// Returns to Normal without consulting the debouncer.
    ///
    /// Does nothing, and returns `false`, when no override is active.
    pub fn force_normal(&mut self, now: I, sequence: &mut SequenceController<I>) -> bool {
        if !self.active.is_override() {
            return false;
        }
        self.exit_override(now, sequence);
        true
    }

    /// Colour for this tick. The sequence only advances in Normal mode.
    pub fn resolve(&self, now: I, sequence: &mut SequenceController<I>) -> SequenceStep {
        let color = match self.active {
            OverrideMode::Normal => return sequence.tick(now),
            OverrideMode::Emergency => LightColor::Red,
            OverrideMode::Blink => LightColor::Toggling,
            OverrideMode::Off => LightColor::Off,
        };
        SequenceStep {
            color,
            entered: None,
        }
    }

    /// Polls the blink ticker and returns the new lamp level when it fires.
    pub fn poll_blink(&mut self, now: I) -> Option<bool> {
        if self.active != OverrideMode::Blink || !self.blink.poll(now) {
            return None;
        }
        self.blink_lit = !self.blink_lit;
        Some(self.blink_lit)
    }

    fn exit_override(&mut self, now: I, sequence: &mut SequenceController<I>) {
        self.active = OverrideMode::Normal;
        self.blink.disable();
        self.blink_lit = false;
        sequence.reset(now);
    }
}
