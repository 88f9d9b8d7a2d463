use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{OutputType, Pull};
use embassy_stm32::time::khz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::adc::{Adc, AdcChannel};

use controller_core::modes::{ModeTrigger, ToggleLatch};

use crate::lamps::{Potentiometer, PwmLamps};
use crate::serial::{InboundQueue, OutboundQueue};

mod button_task;
mod controller_task;
mod uart_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Button edges waiting for the controller task.
pub(super) static TOGGLES: ToggleLatch = ToggleLatch::new();
pub(super) static INBOUND: InboundQueue = InboundQueue::new();
pub(super) static OUTBOUND: OutboundQueue = OutboundQueue::new();

/// Lamp PWM carrier frequency.
const PWM_FREQUENCY_KHZ: u32 = 1;

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA1,
        PA2,
        PA3,
        PA6,
        PA7,
        PB0,
        PB3,
        PB4,
        PB5,
        EXTI3,
        EXTI4,
        EXTI5,
        TIM3,
        ADC1,
        USART2,
        ..
    } = hal::init(config);

    let pwm = SimplePwm::new(
        TIM3,
        Some(PwmPin::new(PA6, OutputType::PushPull)),
        Some(PwmPin::new(PA7, OutputType::PushPull)),
        Some(PwmPin::new(PB0, OutputType::PushPull)),
        None,
        khz(PWM_FREQUENCY_KHZ),
        CountingMode::EdgeAlignedUp,
    );
    let channels = pwm.split();
    let lamps = PwmLamps::new(channels.ch1, channels.ch2, channels.ch3);

    let potentiometer = Potentiometer::new(Adc::new(ADC1), PA1.degrade_adc());

    spawner
        .spawn(controller_task::run(lamps, potentiometer))
        .expect("failed to spawn controller task");

    let buttons = [
        (ExtiInput::new(PB3, EXTI3, Pull::Up), ModeTrigger::Emergency),
        (ExtiInput::new(PB4, EXTI4, Pull::Up), ModeTrigger::Blink),
        (ExtiInput::new(PB5, EXTI5, Pull::Up), ModeTrigger::Off),
    ];
    for (button, trigger) in buttons {
        spawner
            .spawn(button_task::run(button, trigger))
            .expect("failed to spawn button task");
    }

    spawner
        .spawn(uart_task::run(USART2, PA2, PA3))
        .expect("failed to spawn UART task");

    core::future::pending::<()>().await;
}
