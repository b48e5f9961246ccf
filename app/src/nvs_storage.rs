//! `configstore::Storage` backed by the ESP-IDF NVS namespace `"config"`
//! (SPEC_FULL.md §4.3, §6), grounded in the typed accessor style of
//! `esp_idf_svc::nvs::EspNvs` (see `docwilco-tachtalk`'s `config.rs`, though
//! that firmware stores one JSON blob — SPEC_FULL.md's per-id key scheme
//! instead maps directly onto `EspNvs`'s typed `get_u16`/`get_str` pair).

use esp_idf_svc::nvs::{EspNvs, NvsDefault};

const NVS_NAMESPACE: &str = "config";
/// A stored string value never exceeds the widest bounded string parameter
/// (WiFi SSID/password, both `<= 63` bytes); this is a generous scratch size
/// for the read buffer.
const STR_SCRATCH_LEN: usize = 128;

pub struct NvsStorage {
    nvs: EspNvs<NvsDefault>,
}

impl NvsStorage {
    pub fn open(partition: esp_idf_svc::nvs::EspNvsPartition<NvsDefault>) -> Result<Self, configstore::Error> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true).map_err(|_| configstore::Error::IoError)?;
        Ok(Self { nvs })
    }
}

impl configstore::Storage for NvsStorage {
    fn get_u16(&mut self, key: &str) -> Result<Option<u16>, configstore::Error> {
        self.nvs.get_u16(key).map_err(|_| configstore::Error::IoError)
    }

    fn set_u16(&mut self, key: &str, value: u16) -> Result<(), configstore::Error> {
        self.nvs
            .set_u16(key, value)
            .map(|_| ())
            .map_err(|_| configstore::Error::IoError)
    }

    fn get_str(&mut self, key: &str) -> Result<Option<String>, configstore::Error> {
        let len = self
            .nvs
            .str_len(key)
            .map_err(|_| configstore::Error::IoError)?;
        let Some(len) = len else {
            return Ok(None);
        };
        if len > STR_SCRATCH_LEN {
            // Corrupt/oversized value: treated as missing per SPEC_FULL.md
            // §4.3 migration/corruption policy.
            return Ok(None);
        }
        let mut buf = [0u8; STR_SCRATCH_LEN];
        match self.nvs.get_str(key, &mut buf[..len]) {
            Ok(Some(s)) => Ok(Some(s.trim_end_matches('\0').to_owned())),
            Ok(None) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), configstore::Error> {
        self.nvs
            .set_str(key, value)
            .map(|_| ())
            .map_err(|_| configstore::Error::IoError)
    }

    fn remove(&mut self, key: &str) -> Result<(), configstore::Error> {
        self.nvs
            .remove(key)
            .map(|_| ())
            .map_err(|_| configstore::Error::IoError)
    }
}
