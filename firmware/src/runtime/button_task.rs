use embassy_stm32::exti::ExtiInput;

use controller_core::modes::ModeTrigger;

use super::TOGGLES;

/// Latches a toggle on every falling edge; debouncing happens in the controller.
#[embassy_executor::task(pool_size = 3)]
pub async fn run(mut button: ExtiInput<'static>, trigger: ModeTrigger) -> ! {
    loop {
        button.wait_for_falling_edge().await;
        TOGGLES.request(trigger);
        defmt::trace!("button: {} edge", trigger.label());
    }
}
