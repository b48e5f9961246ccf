//! Orchestrator error taxonomy (SPEC_FULL.md §7), grounded in the teacher's
//! `error.rs`: one enum, one `From` impl per foreign error type it wraps.
//! Library-crate errors surface here instead of being papered over; `main`
//! itself works in `anyhow::Result` since nothing past the boot sequence
//! needs to match on a specific variant.

use std::fmt;

#[derive(Debug)]
pub enum Error {
    Esp(esp_idf_sys::EspError),
    Ranging(ranging::Error),
    Display(display::Error),
    ConfigStore(configstore::Error),
    Netif(netif::Error),
    InvalidState(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Esp(e) => write!(f, "esp-idf error: {e}"),
            Error::Ranging(e) => write!(f, "ranging error: {e:?}"),
            Error::Display(e) => write!(f, "display error: {e:?}"),
            Error::ConfigStore(e) => write!(f, "configstore error: {e:?}"),
            Error::Netif(e) => write!(f, "netif error: {e:?}"),
            Error::InvalidState(msg) => write!(f, "invalid state: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<esp_idf_sys::EspError> for Error {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Error::Esp(e)
    }
}

impl From<ranging::Error> for Error {
    fn from(e: ranging::Error) -> Self {
        Error::Ranging(e)
    }
}

impl From<display::Error> for Error {
    fn from(e: display::Error) -> Self {
        Error::Display(e)
    }
}

impl From<configstore::Error> for Error {
    fn from(e: configstore::Error) -> Self {
        Error::ConfigStore(e)
    }
}

impl From<netif::Error> for Error {
    fn from(e: netif::Error) -> Self {
        Error::Netif(e)
    }
}
