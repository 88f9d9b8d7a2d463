use embassy_time::{Duration, Instant, Ticker};

use controller_core::config::ControllerConfig;
use controller_core::controller::TrafficController;
use controller_core::telemetry::EventId;

use super::{INBOUND, OUTBOUND, TOGGLES};
use crate::clock::FirmwareInstant;
use crate::lamps::{Potentiometer, PwmLamps};

/// Cooperative loop period.
const TICK_PERIOD: Duration = Duration::from_millis(10);

#[embassy_executor::task]
pub async fn run(mut lamps: PwmLamps<'static>, mut potentiometer: Potentiometer<'static>) -> ! {
    let mut controller = TrafficController::new(ControllerConfig::default());
    let outbound = OUTBOUND.sender();
    let inbound = INBOUND.receiver();
    let mut last_logged: Option<EventId> = None;
    let mut ticker = Ticker::every(TICK_PERIOD);

    loop {
        let now = FirmwareInstant::from(Instant::now());

        controller.apply_pending(&TOGGLES, now);
        if let Ok(line) = inbound.try_receive() {
            let outcome = controller.handle_line(&line, now);
            defmt::debug!("serial: {} -> {}", line.as_str(), defmt::Debug2Format(&outcome));
        }

        controller.drive(now, potentiometer.sample(), &mut lamps);

        while let Some(line) = controller.pop_line() {
            if outbound.try_send(line).is_err() {
                defmt::warn!("serial: outbound queue full, dropping status line");
            }
        }

        for record in controller.telemetry().since(last_logged) {
            let event = defmt::Display2Format(&record.event);
            if record.event.is_warning() {
                defmt::warn!("[{=u64}ms] {}", record.timestamp.as_millis(), event);
            } else {
                defmt::info!("[{=u64}ms] {}", record.timestamp.as_millis(), event);
            }
            last_logged = Some(record.id);
        }

        ticker.next().await;
    }
}
