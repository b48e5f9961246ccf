//! `netif::TimedByteSource` / `netif::ByteSink` over an `esp-idf-hal` UART
//! (SPEC_FULL.md §4.4: the serial-frame netif's byte-oriented transport).

use std::time::Duration;

use esp_idf_hal::uart::UartDriver;

pub struct UartLink<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartLink<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl netif::TimedByteSource for UartLink<'_> {
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, netif::Error> {
        let mut buf = [0u8; 1];
        let timeout_ms = timeout.as_millis().max(1) as u32;
        match self.uart.read(&mut buf, timeout_ms) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.code() == esp_idf_sys::ESP_ERR_TIMEOUT => Ok(None),
            Err(e) => Err(netif::Error::IoError(std::io::Error::other(e))),
        }
    }
}

impl netif::ByteSink for UartLink<'_> {
    fn write_all(&mut self, buf: &[u8]) -> Result<(), netif::Error> {
        self.uart
            .write(buf)
            .map(|_| ())
            .map_err(|e| netif::Error::IoError(std::io::Error::other(e)))
    }
}
