//! `display::LedTransport` backed by `ws2812-esp32-rmt-driver`'s RMT-based
//! WS2812 writer (SPEC_FULL.md §2 L1 "LED transport": GRB serialization plus
//! the required reset gap, both handled by the driver).

use display::colors::Color;
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::rmt::RmtChannel;
use smart_leds::SmartLedsWrite;
use ws2812_esp32_rmt_driver::driver::color::LedPixelColorGrb24;
use ws2812_esp32_rmt_driver::LedPixelEsp32Rmt;

pub struct Ws2812Transport {
    driver: LedPixelEsp32Rmt<LedPixelColorGrb24>,
}

impl Ws2812Transport {
    pub fn new(
        channel: impl Peripheral<P = impl RmtChannel> + 'static,
        pin: impl Peripheral<P = impl OutputPin> + 'static,
    ) -> Result<Self, crate::error::Error> {
        let driver = LedPixelEsp32Rmt::new(channel, pin)?;
        Ok(Self { driver })
    }
}

impl display::LedTransport for Ws2812Transport {
    fn commit(&mut self, pixels: &[Color]) -> Result<(), display::Error> {
        let colors: Vec<smart_leds::RGB8> = pixels
            .iter()
            .map(|c| smart_leds::RGB8::new(c.r, c.g, c.b))
            .collect();
        self.driver
            .write(colors.into_iter())
            .map_err(|_| display::Error::IoError)
    }
}
