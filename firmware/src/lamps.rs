//! PWM lamp outputs and potentiometer sampling.
//!
//! Scaling helpers are plain functions so they can be exercised on the host.
//! The hardware bindings below are only compiled for the MCU.

use controller_core::lamps::{ANALOG_FULL_SCALE, MAX_INTENSITY};
#[cfg(target_os = "none")]
use controller_core::lamps::{LampDriver, LampLevels};
#[cfg(target_os = "none")]
use embassy_stm32::adc::{Adc, AnyAdcChannel};
#[cfg(target_os = "none")]
use embassy_stm32::peripherals::{ADC1, TIM3};
#[cfg(target_os = "none")]
use embassy_stm32::timer::simple_pwm::SimplePwmChannel;

/// Full-scale reading of the 12-bit ADC.
pub const ADC_FULL_SCALE: u16 = 4_095;

/// Converts a lamp intensity into a PWM compare value.
#[must_use]
pub fn scale_duty(level: u8, max_duty: u16) -> u16 {
    let scaled = u32::from(level) * u32::from(max_duty) / u32::from(MAX_INTENSITY);
    u16::try_from(scaled).unwrap_or(max_duty)
}

/// Reduces a 12-bit ADC conversion to the 10-bit range the core expects.
#[must_use]
pub fn adc_to_sample(raw: u16) -> u16 {
    let clamped = u32::from(raw.min(ADC_FULL_SCALE));
    let scaled = clamped * u32::from(ANALOG_FULL_SCALE) / u32::from(ADC_FULL_SCALE);
    u16::try_from(scaled).unwrap_or(ANALOG_FULL_SCALE)
}

/// Three PWM channels of TIM3 driving the lamp MOSFETs.
#[cfg(target_os = "none")]
pub struct PwmLamps<'d> {
    red: SimplePwmChannel<'d, TIM3>,
    yellow: SimplePwmChannel<'d, TIM3>,
    green: SimplePwmChannel<'d, TIM3>,
}

#[cfg(target_os = "none")]
impl<'d> PwmLamps<'d> {
    pub fn new(
        mut red: SimplePwmChannel<'d, TIM3>,
        mut yellow: SimplePwmChannel<'d, TIM3>,
        mut green: SimplePwmChannel<'d, TIM3>,
    ) -> Self {
        for channel in [&mut red, &mut yellow, &mut green] {
            channel.set_duty_cycle_fully_off();
            channel.enable();
        }
        Self { red, yellow, green }
    }
}

#[cfg(target_os = "none")]
impl LampDriver for PwmLamps<'_> {
    fn apply(&mut self, levels: LampLevels) {
        for (channel, level) in [
            (&mut self.red, levels.red),
            (&mut self.yellow, levels.yellow),
            (&mut self.green, levels.green),
        ] {
            let duty = scale_duty(level, channel.max_duty_cycle());
            channel.set_duty_cycle(duty);
        }
    }
}

/// Potentiometer wiper on an ADC1 input.
#[cfg(target_os = "none")]
pub struct Potentiometer<'d> {
    adc: Adc<'d, ADC1>,
    channel: AnyAdcChannel<ADC1>,
}

#[cfg(target_os = "none")]
impl<'d> Potentiometer<'d> {
    pub fn new(adc: Adc<'d, ADC1>, channel: AnyAdcChannel<ADC1>) -> Self {
        Self { adc, channel }
    }

    /// Blocking conversion scaled to `0..=1023`.
    pub fn sample(&mut self) -> u16 {
        adc_to_sample(self.adc.blocking_read(&mut self.channel))
    }
}
