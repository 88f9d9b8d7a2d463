use embassy_futures::join::join;
use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_time::{Duration, Timer};
use embedded_io_async::{Read, Write};
use static_cell::StaticCell;

use super::{INBOUND, OUTBOUND};
use crate::serial::{LineAssembler, SERIAL_BAUD, encode_status};

const UART_BUFFER_SIZE: usize = 128;
const ERROR_BACKOFF: Duration = Duration::from_millis(5);

static UART_TX_BUFFER: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();
static UART_RX_BUFFER: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART2_LPUART2 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART2>;
});

#[embassy_executor::task]
pub async fn run(
    usart: Peri<'static, hal::peripherals::USART2>,
    tx_pin: Peri<'static, hal::peripherals::PA2>,
    rx_pin: Peri<'static, hal::peripherals::PA3>,
) -> ! {
    let mut config = UartConfig::default();
    config.baudrate = SERIAL_BAUD;
    config.data_bits = DataBits::DataBits8;
    config.stop_bits = StopBits::STOP1;
    config.parity = Parity::ParityNone;

    let uart = BufferedUart::new(
        usart,
        rx_pin,
        tx_pin,
        UART_TX_BUFFER.init([0; UART_BUFFER_SIZE]),
        UART_RX_BUFFER.init([0; UART_BUFFER_SIZE]),
        UartIrqs,
        config,
    )
    .expect("failed to initialize command UART");

    let (mut uart_tx, mut uart_rx) = uart.split();
    let inbound = INBOUND.sender();
    let outbound = OUTBOUND.receiver();

    let reader = async move {
        let mut assembler = LineAssembler::new();
        let mut chunk = [0u8; 16];
        loop {
            match uart_rx.read(&mut chunk).await {
                Ok(count) => {
                    for byte in &chunk[..count] {
                        match assembler.ingest(*byte) {
                            Some(Ok(line)) => inbound.send(line).await,
                            Some(Err(error)) => defmt::warn!("serial: dropped line ({})", error),
                            None => {}
                        }
                    }
                }
                Err(_) => {
                    defmt::warn!("serial: UART read error");
                    Timer::after(ERROR_BACKOFF).await;
                }
            }
        }
    };

    let writer = async move {
        loop {
            let line = outbound.receive().await;
            let Ok(encoded) = encode_status(&line) else {
                defmt::warn!("serial: status line too long");
                continue;
            };
            if uart_tx.write_all(encoded.as_bytes()).await.is_err() {
                defmt::warn!("serial: UART write error");
                Timer::after(ERROR_BACKOFF).await;
                continue;
            }
            if uart_tx.flush().await.is_err() {
                defmt::warn!("serial: UART flush error");
                Timer::after(ERROR_BACKOFF).await;
            }
        }
    };

    join(reader, writer).await;
    loop {
        core::future::pending::<()>().await;
    }
}
