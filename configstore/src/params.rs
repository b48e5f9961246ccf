//! Table-driven parameter metadata (SPEC_FULL.md §4.3, §6). Parameter ids
//! are the external contract: stable across firmware revisions, persisted
//! under `"u<id>"`/`"s<id>"` NVS keys.

/// Compile-time metadata for a `u16` parameter.
#[derive(Debug, Clone, Copy)]
pub struct U16Meta {
    pub min: u16,
    pub max: u16,
    pub default: u16,
}

/// Compile-time metadata for a bounded string parameter.
#[derive(Debug, Clone, Copy)]
pub struct StrMeta {
    pub min_len: usize,
    pub max_len: usize,
    pub default: &'static str,
}

macro_rules! u16_params {
    ($($variant:ident = $id:literal { min: $min:expr, max: $max:expr, default: $default:expr }),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum U16Param {
            $($variant = $id,)+
        }

        impl U16Param {
            pub const ALL: &'static [U16Param] = &[$(U16Param::$variant,)+];

            pub const fn id(self) -> u16 {
                self as u16
            }

            pub const fn meta(self) -> U16Meta {
                match self {
                    $(U16Param::$variant => U16Meta { min: $min, max: $max, default: $default },)+
                }
            }
        }
    };
}

macro_rules! str_params {
    ($($variant:ident = $id:literal { min_len: $min_len:expr, max_len: $max_len:expr, default: $default:expr }),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum StrParam {
            $($variant = $id,)+
        }

        impl StrParam {
            pub const ALL: &'static [StrParam] = &[$(StrParam::$variant,)+];

            pub const fn id(self) -> u16 {
                self as u16
            }

            pub const fn meta(self) -> StrMeta {
                match self {
                    $(StrParam::$variant => StrMeta { min_len: $min_len, max_len: $max_len, default: $default },)+
                }
            }
        }
    };
}

u16_params! {
    WifiApChannel         = 0  { min: 1,   max: 13,    default: 6 },
    WifiApMaxConnections  = 1  { min: 1,   max: 10,    default: 4 },
    WifiStaMaxRetry       = 2  { min: 0,   max: 20,    default: 5 },
    WifiStaTimeoutMs      = 3  { min: 1000, max: 60_000, default: 10_000 },
    DistanceMinMm         = 4  { min: 20,  max: 3999,  default: 100 },
    DistanceMaxMm         = 5  { min: 21,  max: 4000,  default: 500 },
    SmoothingFactor       = 6  { min: 0,   max: 1000,  default: 300 },
    LedCount              = 7  { min: 1,   max: 100,   default: 40 },
    LedBrightness         = 8  { min: 0,   max: 255,   default: 64 },
    MeasurementIntervalMs = 9  { min: 20,  max: 2000,  default: 100 },
    SensorTimeoutMs       = 10 { min: 5,   max: 200,   default: 30 },
    HttpPort              = 11 { min: 1,   max: 65_535, default: 80 },
}

str_params! {
    WifiSsid     = 0 { min_len: 1, max_len: 32, default: "parking-aid" },
    WifiPassword = 1 { min_len: 0, max_len: 63, default: "" },
}

/// Persistence key for a `u16` parameter, e.g. `"u6"` for `SmoothingFactor`.
pub fn u16_key(param: U16Param) -> String {
    format!("u{}", param.id())
}

/// Persistence key for a string parameter, e.g. `"s0"` for `WifiSsid`.
pub fn str_key(param: StrParam) -> String {
    format!("s{}", param.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_u16_param_has_a_sane_range() {
        for &p in U16Param::ALL {
            let m = p.meta();
            assert!(m.min <= m.max, "{p:?} has min > max");
            assert!(
                (m.min..=m.max).contains(&m.default),
                "{p:?} default out of bounds"
            );
        }
    }

    #[test]
    fn every_str_param_has_a_sane_range() {
        for &p in StrParam::ALL {
            let m = p.meta();
            assert!(m.min_len <= m.max_len, "{p:?} has min_len > max_len");
            let len = m.default.len();
            assert!(
                (m.min_len..=m.max_len).contains(&len),
                "{p:?} default out of bounds"
            );
        }
    }

    #[test]
    fn keys_use_distinct_prefixes() {
        assert_eq!(u16_key(U16Param::SmoothingFactor), "u6");
        assert_eq!(str_key(StrParam::WifiSsid), "s0");
    }
}
