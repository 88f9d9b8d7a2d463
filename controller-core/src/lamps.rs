//! Lamp outputs and potentiometer brightness scaling.
//!
//! The control core never touches PWM hardware. It resolves a [`LightColor`]
//! plus a mapped brightness into per-channel [`LampLevels`], and platforms
//! push those levels through a [`LampDriver`].

/// Largest raw sample produced by the 10-bit analog input.
pub const ANALOG_FULL_SCALE: u16 = 1023;

/// Largest intensity written to a lamp channel.
pub const MAX_INTENSITY: u8 = 255;

/// Visual output currently commanded for the rig.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LightColor {
    #[default]
    Off,
    Red,
    Yellow,
    Green,
    /// All three lamps driven together by the blink ticker.
    Toggling,
}

/// Physical lamp channels in wiring order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Lamp {
    Red,
    Yellow,
    Green,
}

/// Every lamp channel, top to bottom.
pub const ALL_LAMPS: [Lamp; 3] = [Lamp::Red, Lamp::Yellow, Lamp::Green];

/// Linear rescale of a raw potentiometer sample into a lamp intensity.
///
/// Samples above [`ANALOG_FULL_SCALE`] clamp to full brightness.
#[must_use]
pub fn map_brightness(raw: u16) -> u8 {
    let clamped = u32::from(raw.min(ANALOG_FULL_SCALE));
    let scaled = clamped * u32::from(MAX_INTENSITY) / u32::from(ANALOG_FULL_SCALE);
    u8::try_from(scaled).unwrap_or(MAX_INTENSITY)
}

/// Intensity written to each lamp channel for one tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LampLevels {
    pub red: u8,
    pub yellow: u8,
    pub green: u8,
}

impl LampLevels {
    /// Every channel dark.
    pub const OFF: Self = Self {
        red: 0,
        yellow: 0,
        green: 0,
    };

    /// Resolves a commanded colour into channel intensities.
    ///
    /// `blink_lit` only matters for [`LightColor::Toggling`], where all three
    /// channels share the same value.
    #[must_use]
    pub const fn resolve(color: LightColor, brightness: u8, blink_lit: bool) -> Self {
        match color {
            LightColor::Off => Self::OFF,
            LightColor::Red => Self {
                red: brightness,
                ..Self::OFF
            },
            LightColor::Yellow => Self {
                yellow: brightness,
                ..Self::OFF
            },
            LightColor::Green => Self {
                green: brightness,
                ..Self::OFF
            },
            LightColor::Toggling => {
                let level = if blink_lit { brightness } else { 0 };
                Self {
                    red: level,
                    yellow: level,
                    green: level,
                }
            }
        }
    }

    /// Returns the intensity for a single channel.
    #[must_use]
    pub const fn level(&self, lamp: Lamp) -> u8 {
        match lamp {
            Lamp::Red => self.red,
            Lamp::Yellow => self.yellow,
            Lamp::Green => self.green,
        }
    }

    /// Number of channels currently driven above zero.
    #[must_use]
    pub fn lit_count(&self) -> usize {
        ALL_LAMPS
            .iter()
            .filter(|lamp| self.level(**lamp) > 0)
            .count()
    }
}

/// Abstraction over the physical lamp outputs.
pub trait LampDriver {
    /// Drives every channel to the supplied intensities.
    fn apply(&mut self, levels: LampLevels);

    /// Turns every lamp off.
    fn all_off(&mut self) {
        self.apply(LampLevels::OFF);
    }
}

/// Lamp driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopLampDriver;

impl NoopLampDriver {
    /// Creates a new no-op lamp driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LampDriver for NoopLampDriver {
    fn apply(&mut self, _: LampLevels) {}
}
