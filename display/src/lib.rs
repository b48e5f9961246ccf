//! Frame-composited LED renderer (SPEC_FULL.md §4.2): a periodic compositor
//! that reads the latest `Measurement` and a config snapshot, composes a
//! frame through priority-ordered layers, and commits it to the LED
//! transport as a single atomic write.

pub mod colors;
pub mod zones;

use colors::Color;
use ranging::{Measurement, MeasurementStatus};
use zones::IdealZone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    InvalidState,
    IoError,
}

/// Capability trait for the LED peripheral (SPEC_FULL.md §2 L1 "LED
/// transport"): serializes the buffer as GRB bytes with the required reset
/// gap, transmitting it atomically. The real implementation wraps
/// `ws2812-esp32-rmt-driver`'s `SmartLedsWrite`; a recording mock drives
/// tests here.
pub trait LedTransport {
    fn commit(&mut self, pixels: &[Color]) -> Result<(), Error>;
}

/// Config snapshot the compositor reads once at `start()` (SPEC_FULL.md §9
/// open question, resolved: snapshotting per-tick would add lock traffic
/// for no benefit since these values require a reboot to change anyway).
#[derive(Debug, Clone, Copy)]
pub struct DisplayConfig {
    pub led_count: u16,
    pub min_mm: u16,
    pub max_mm: u16,
    pub brightness: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnimMode {
    TooFar,
    TooClose,
}

#[derive(Debug, Clone, Copy)]
pub struct DisplayState {
    pub anim_pos: u8,
    pub anim_dir: i8,
    pub blink_on: bool,
    pub last_toggle_us: u64,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            anim_pos: 0,
            anim_dir: 1,
            blink_on: true,
            last_toggle_us: 0,
        }
    }
}

const BLINK_PERIOD_US: u64 = 500_000;
const EMERGENCY_HINT_PIXEL: usize = 0;

/// Owns the frame buffer exclusively; every other subsystem touches the LED
/// transport, never this buffer directly (SPEC_FULL.md §3 ownership rule).
pub struct Compositor<T: LedTransport> {
    transport: T,
    config: DisplayConfig,
    buf: Vec<Color>,
    state: DisplayState,
}

impl<T: LedTransport> Compositor<T> {
    /// Starts the compositor against a snapshot of the active config. Fails
    /// with `InvalidState` on a degenerate strip length.
    pub fn start(transport: T, config: DisplayConfig) -> Result<Self, Error> {
        if config.led_count == 0 {
            return Err(Error::InvalidState);
        }
        Ok(Self {
            transport,
            buf: vec![colors::BLACK; config.led_count as usize],
            state: DisplayState::default(),
            config,
        })
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Composes and emits one frame for `measurement` (SPEC_FULL.md §4.2
    /// rendering pipeline and measurement-status handling).
    pub fn on_tick(&mut self, measurement: Measurement, now_us: u64) -> Result<(), Error> {
        self.buf.iter_mut().for_each(|p| *p = colors::BLACK);

        match measurement.status {
            MeasurementStatus::Timeout => {}
            MeasurementStatus::OutOfRange | MeasurementStatus::NoEcho | MeasurementStatus::Invalid => {
                self.buf[EMERGENCY_HINT_PIXEL] = colors::RED;
            }
            MeasurementStatus::Ok => self.render_ok(measurement.distance_mm, now_us),
        }

        let brightness = self.config.brightness;
        for p in &mut self.buf {
            *p = colors::at_brightness(*p, brightness);
        }

        self.transport.commit(&self.buf)
    }

    fn render_ok(&mut self, d_mm: u16, now_us: u64) {
        let n = self.config.led_count;
        let zone = zones::ideal_zone(n);

        if d_mm < self.config.min_mm {
            self.render_emergency(zone, now_us);
            return;
        }

        let idx = zones::position_index(d_mm, self.config.min_mm, self.config.max_mm, n);

        // Step 2: ideal-zone background, 2% red, unless overridden below.
        paint_range(&mut self.buf, zone.start, zone.end, colors::at_pct(colors::RED, 2));

        if zone.start <= idx && idx <= zone.end {
            // Step 5: full-brightness override, suppresses animation/position.
            paint_range(&mut self.buf, zone.start, zone.end, colors::RED);
        } else if idx < zone.start {
            self.advance_animation(AnimMode::TooClose, zone);
            self.buf[self.state.anim_pos as usize] = colors::RED;
            self.buf[idx as usize] = colors::at_pct(colors::ORANGE, 50);
        } else {
            // idx > zone.end, or d_mm above max_mm (clamped into the same idx).
            self.advance_animation(AnimMode::TooFar, zone);
            self.buf[self.state.anim_pos as usize] = colors::at_pct(colors::WHITE, 2);
            self.buf[idx as usize] = colors::GREEN;
        }
    }

    fn render_emergency(&mut self, _zone: IdealZone, now_us: u64) {
        if now_us.saturating_sub(self.state.last_toggle_us) >= BLINK_PERIOD_US {
            self.state.blink_on = !self.state.blink_on;
            self.state.last_toggle_us = now_us;
        }
        if self.state.blink_on {
            let mut i = 0usize;
            while i < self.buf.len() {
                self.buf[i] = colors::RED;
                i += 10;
            }
        }
    }

    fn advance_animation(&mut self, mode: AnimMode, zone: IdealZone) {
        let n = self.config.led_count;
        match mode {
            AnimMode::TooFar => {
                self.state.anim_dir = -1;
                let floor = zone.end;
                let ceiling = (n - 1) as u8;
                if self.state.anim_pos < floor as u8 || self.state.anim_pos > ceiling {
                    self.state.anim_pos = ceiling;
                } else if self.state.anim_pos == floor as u8 {
                    self.state.anim_pos = ceiling;
                } else {
                    self.state.anim_pos -= 1;
                }
            }
            AnimMode::TooClose => {
                self.state.anim_dir = 1;
                let ceiling = zone.start as u8;
                if self.state.anim_pos > ceiling {
                    self.state.anim_pos = 0;
                } else if self.state.anim_pos == ceiling {
                    self.state.anim_pos = 0;
                } else {
                    self.state.anim_pos += 1;
                }
            }
        }
    }
}

fn paint_range(buf: &mut [Color], start: u16, end: u16, color: Color) {
    for i in start..=end {
        if let Some(p) = buf.get_mut(i as usize) {
            *p = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingTransport {
        last: Vec<Color>,
        commits: u32,
    }

    impl LedTransport for RecordingTransport {
        fn commit(&mut self, pixels: &[Color]) -> Result<(), Error> {
            self.last = pixels.to_vec();
            self.commits += 1;
            Ok(())
        }
    }

    fn cfg() -> DisplayConfig {
        DisplayConfig {
            led_count: 40,
            min_mm: 100,
            max_mm: 500,
            brightness: 255,
        }
    }

    fn transport() -> RecordingTransport {
        RecordingTransport {
            last: Vec::new(),
            commits: 0,
        }
    }

    fn measurement(distance_mm: u16, status: MeasurementStatus) -> Measurement {
        Measurement {
            distance_mm,
            timestamp_us: 0,
            status,
        }
    }

    #[test]
    fn scenario_1_position_39_green_full() {
        let mut c = Compositor::start(transport(), cfg()).unwrap();
        c.on_tick(measurement(515, MeasurementStatus::Ok), 0).unwrap();
        assert_eq!(c.transport.last[39], colors::GREEN);
    }

    #[test]
    fn scenario_3_emergency_blink_pattern() {
        let mut c = Compositor::start(transport(), cfg()).unwrap();
        // blink_on starts true; first tick at t=0 doesn't cross the 500ms
        // threshold from last_toggle_us=0, so it stays true.
        c.on_tick(measurement(50, MeasurementStatus::Ok), 0).unwrap();
        for i in (0..40).step_by(10) {
            assert_eq!(c.transport.last[i], colors::RED, "pixel {i} should be red");
        }
        for i in 1..40 {
            if i % 10 != 0 {
                assert_eq!(c.transport.last[i], colors::BLACK);
            }
        }
    }

    #[test]
    fn emergency_toggles_off_after_blink_period() {
        let mut c = Compositor::start(transport(), cfg()).unwrap();
        c.on_tick(measurement(50, MeasurementStatus::Ok), 0).unwrap();
        assert!(c.state().blink_on);
        c.on_tick(measurement(50, MeasurementStatus::Ok), 500_000).unwrap();
        assert!(!c.state().blink_on);
        assert_eq!(c.transport.last[0], colors::BLACK);
    }

    #[test]
    fn timeout_clears_all_pixels() {
        let mut c = Compositor::start(transport(), cfg()).unwrap();
        c.on_tick(measurement(300, MeasurementStatus::Ok), 0).unwrap();
        c.on_tick(measurement(0, MeasurementStatus::Timeout), 100).unwrap();
        assert!(c.transport.last.iter().all(|&p| p == colors::BLACK));
    }

    #[test]
    fn out_of_range_lights_designated_hint_pixel_only() {
        let mut c = Compositor::start(transport(), cfg()).unwrap();
        c.on_tick(measurement(0, MeasurementStatus::OutOfRange), 0).unwrap();
        assert_eq!(c.transport.last[0], colors::RED);
        assert!(c.transport.last[1..].iter().all(|&p| p == colors::BLACK));
    }

    #[test]
    fn ideal_zone_position_paints_full_zone_red() {
        let mut c = Compositor::start(transport(), cfg()).unwrap();
        // N=40, zone [10,13]; d_mm=300 maps into the ideal zone.
        c.on_tick(measurement(300, MeasurementStatus::Ok), 0).unwrap();
        for i in 10..=13 {
            assert_eq!(c.transport.last[i], colors::RED);
        }
    }

    #[test]
    fn start_rejects_zero_length_strip() {
        let mut cfg = cfg();
        cfg.led_count = 0;
        assert_eq!(Compositor::start(transport(), cfg).unwrap_err(), Error::InvalidState);
    }

    #[test]
    fn each_tick_commits_exactly_once() {
        let mut c = Compositor::start(transport(), cfg()).unwrap();
        c.on_tick(measurement(300, MeasurementStatus::Ok), 0).unwrap();
        c.on_tick(measurement(300, MeasurementStatus::Ok), 100).unwrap();
        assert_eq!(c.transport.commits, 2);
    }
}
