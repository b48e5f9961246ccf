//! Peripheral wiring: claims the concrete GPIO/RMT/UART/NVS peripherals and
//! hands back the board-level handles `main` spawns tasks against. Grounded
//! in the teacher's `init_board`: one function, one `Board` struct, `?`
//! throughout.

use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvsPartition, NvsDefault};

use crate::error::Error;
use crate::led_transport::Ws2812Transport;
use crate::serial_link::UartLink;

pub struct Board {
    pub nvs: EspNvsPartition<NvsDefault>,
    pub trigger_pin: AnyIOPin,
    pub echo_pin: AnyIOPin,
    pub led_transport: Ws2812Transport,
    pub netif_link: UartLink<'static>,
}

/// Pin assignments for a typical ESP32 devkit breakout. SPEC_FULL.md leaves
/// exact board wiring to the orchestrator.
const NETIF_BAUD: u32 = 115_200;

pub fn init_board() -> Result<Board, Error> {
    let peripherals = Peripherals::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let trigger_pin: AnyIOPin = peripherals.pins.gpio4.into();
    let echo_pin: AnyIOPin = peripherals.pins.gpio5.into();

    let led_transport = Ws2812Transport::new(peripherals.rmt.channel0, peripherals.pins.gpio18)?;

    let uart_config = UartConfig::new().baudrate(NETIF_BAUD.Hz().into());
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;

    Ok(Board {
        nvs,
        trigger_pin,
        echo_pin,
        led_transport,
        netif_link: UartLink::new(uart),
    })
}
