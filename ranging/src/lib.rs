//! Ultrasonic ranging core (SPEC_FULL.md §4.1): trigger/edge/compute/smooth,
//! publishing `Measurement`s at a configured cadence. Isolated from any
//! concrete GPIO or clock type behind the [`Clock`], [`Trigger`] and
//! [`EchoWait`] traits so the worker step can run, and be tested, on the
//! host; the orchestrator binary supplies `esp-idf-hal`-backed
//! implementations and drives [`run_worker`] on its own thread.

pub mod distance;
pub mod isr;
pub mod queue;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use isr::IsrState;
use queue::{ProcessedQueue, RawQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    InvalidArg,
}

/// A completed rising-to-falling edge pair, handed from the ISR to the
/// worker (SPEC_FULL.md §3). `end_us >= start_us` is an invariant of the ISR
/// that produces it; `process_cycle` still guards against a corrupt value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEcho {
    pub start_us: u64,
    pub end_us: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementStatus {
    Ok,
    Timeout,
    OutOfRange,
    NoEcho,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub distance_mm: u16,
    pub timestamp_us: u64,
    pub status: MeasurementStatus,
}

/// Trigger/echo line ids, cadence, and sensing parameters. Read-only after
/// `RangingCore::init`; changes require a reboot (SPEC_FULL.md §3).
#[derive(Debug, Clone, Copy)]
pub struct SensorConfig {
    pub trigger_pin: u32,
    pub echo_pin: u32,
    pub measurement_period_ms: u32,
    pub echo_timeout_ms: u32,
    pub temp_c_x10: i32,
    pub smoothing_factor: u16,
}

/// Monotonic microsecond time source (SPEC_FULL.md §2 L1 "Time source").
pub trait Clock {
    fn now_us(&self) -> u64;
}

/// Drives the trigger line through the full step-1 pulse: assert high,
/// busy-delay 10 µs, assert low. The only permissible busy-wait in the core.
pub trait Trigger {
    fn pulse(&mut self);
}

/// Blocks up to `timeout` waiting for the next completed echo. Backed on
/// real hardware by an ISR-signaled FreeRTOS notification plus a
/// [`RawQueue`] drain; backed in tests by a canned sequence.
pub trait EchoWait {
    fn wait(&self, timeout: Duration) -> Option<RawEcho>;
}

/// Ranging core: owns the raw/processed queues and the ISR-facing edge
/// state. Hardware wiring (pins, interrupt registration, thread spawning)
/// lives in the orchestrator binary; this type is the hardware-agnostic
/// heart of SPEC_FULL.md §4.1.
pub struct RangingCore {
    raw: RawQueue<3>,
    processed: ProcessedQueue<Measurement>,
    isr: IsrState,
    running: AtomicBool,
}

impl RangingCore {
    /// Allocates the two bounded channels (raw capacity 2, processed
    /// capacity 5) and clamps an out-of-range smoothing factor to `[0,
    /// 1000]` with a warning, per SPEC_FULL.md §4.1.
    pub fn init(cfg: &mut SensorConfig) -> Self {
        if cfg.smoothing_factor > 1000 {
            log::warn!(
                "ranging: smoothing_factor {} out of range, clamping to 1000",
                cfg.smoothing_factor
            );
            cfg.smoothing_factor = 1000;
        }
        Self {
            raw: RawQueue::new(),
            processed: ProcessedQueue::new(5),
            isr: IsrState::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Relaxed);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// ISR entry point for a rising edge. Never blocks, never allocates.
    pub fn on_rising_edge(&self, now_us: u64) {
        self.isr.on_rising_edge(now_us);
    }

    /// ISR entry point for a falling edge. Never blocks, never allocates; a
    /// full raw queue silently drops the echo (the worker is expected to
    /// drain it well within one measurement period).
    pub fn on_falling_edge(&self, now_us: u64) {
        if let Some(echo) = self.isr.on_falling_edge(now_us) {
            if !self.raw.try_send(echo) {
                log::warn!("ranging: raw queue full, dropping echo");
            }
        }
    }

    pub(crate) fn try_recv_raw(&self) -> Option<RawEcho> {
        self.raw.try_recv()
    }

    pub(crate) fn publish(&self, m: Measurement) {
        self.processed.push(m);
    }

    /// Blocks indefinitely until a `Measurement` is available.
    pub fn get_latest(&self) -> Measurement {
        self.processed.pop_blocking()
    }

    pub fn has_new(&self) -> bool {
        self.processed.has_new()
    }

    pub fn overflow_count(&self) -> u64 {
        self.processed.overflow_count()
    }
}

/// One iteration of the worker contract (SPEC_FULL.md §4.1 steps 1-6);
/// sleeping for the configured period (step 7) is the caller's job, since it
/// is the one part of the loop with nothing left to test.
pub fn process_cycle<C: Clock, T: Trigger, W: EchoWait>(
    clock: &C,
    trigger: &mut T,
    wait: &W,
    cfg: &SensorConfig,
    prev_smoothed: &mut Option<u16>,
) -> Measurement {
    trigger.pulse();

    let echo = match wait.wait(Duration::from_millis(cfg.echo_timeout_ms as u64)) {
        Some(echo) => echo,
        None => {
            return Measurement {
                distance_mm: 0,
                timestamp_us: clock.now_us(),
                status: MeasurementStatus::Timeout,
            }
        }
    };

    let dur_us = match echo.end_us.checked_sub(echo.start_us) {
        Some(dur) => dur,
        None => {
            return Measurement {
                distance_mm: 0,
                timestamp_us: echo.end_us,
                status: MeasurementStatus::Invalid,
            }
        }
    };
    if dur_us == 0 {
        return Measurement {
            distance_mm: 0,
            timestamp_us: echo.end_us,
            status: MeasurementStatus::NoEcho,
        };
    }

    let raw_mm = distance::distance_mm(dur_us, cfg.temp_c_x10);
    if !distance::is_valid(raw_mm) {
        return Measurement {
            distance_mm: raw_mm,
            timestamp_us: echo.end_us,
            status: MeasurementStatus::OutOfRange,
        };
    }

    let smoothed = match *prev_smoothed {
        Some(prev) => distance::ema_update(prev, raw_mm, cfg.smoothing_factor),
        None => raw_mm,
    };
    *prev_smoothed = Some(smoothed);

    Measurement {
        distance_mm: smoothed,
        timestamp_us: echo.end_us,
        status: MeasurementStatus::Ok,
    }
}

/// Drives [`process_cycle`] until [`RangingCore::stop`] is called, sleeping
/// `cfg.measurement_period_ms` between cycles. Runs on its own task/thread in
/// the orchestrator; `sleep_ms` is injected so the loop has no direct
/// dependency on a concrete sleep implementation.
pub fn run_worker<C: Clock, T: Trigger, W: EchoWait>(
    core: &RangingCore,
    cfg: &SensorConfig,
    clock: &C,
    trigger: &mut T,
    wait: &W,
    mut sleep_ms: impl FnMut(u32),
) {
    let mut prev_smoothed: Option<u16> = None;
    while core.is_running() {
        let m = process_cycle(clock, trigger, wait, cfg, &mut prev_smoothed);
        core.publish(m);
        sleep_ms(cfg.measurement_period_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedClock(Cell<u64>);
    impl Clock for FixedClock {
        fn now_us(&self) -> u64 {
            self.0.get()
        }
    }

    struct NoopTrigger {
        pulses: u32,
    }
    impl Trigger for NoopTrigger {
        fn pulse(&mut self) {
            self.pulses += 1;
        }
    }

    struct ScriptedWait(Cell<std::collections::VecDeque<Option<RawEcho>>>);
    impl ScriptedWait {
        fn new(script: Vec<Option<RawEcho>>) -> Self {
            Self(Cell::new(script.into()))
        }
    }
    impl EchoWait for ScriptedWait {
        fn wait(&self, _timeout: Duration) -> Option<RawEcho> {
            let mut q = self.0.take();
            let next = q.pop_front().flatten();
            self.0.set(q);
            next
        }
    }

    fn cfg() -> SensorConfig {
        SensorConfig {
            trigger_pin: 0,
            echo_pin: 1,
            measurement_period_ms: 100,
            echo_timeout_ms: 30,
            temp_c_x10: 200,
            smoothing_factor: 300,
        }
    }

    #[test]
    fn scenario_1_pulses_then_publishes_ok_with_known_distance() {
        let clock = FixedClock(Cell::new(3000));
        let mut trigger = NoopTrigger { pulses: 0 };
        let wait = ScriptedWait::new(vec![Some(RawEcho {
            start_us: 0,
            end_us: 3000,
        })]);
        let mut prev = None;
        let m = process_cycle(&clock, &mut trigger, &wait, &cfg(), &mut prev);
        assert_eq!(trigger.pulses, 1);
        assert_eq!(m.status, MeasurementStatus::Ok);
        assert_eq!(m.distance_mm, 515);
    }

    #[test]
    fn echo_timeout_publishes_timeout_status() {
        let clock = FixedClock(Cell::new(42));
        let mut trigger = NoopTrigger { pulses: 0 };
        let wait = ScriptedWait::new(vec![None]);
        let mut prev = None;
        let m = process_cycle(&clock, &mut trigger, &wait, &cfg(), &mut prev);
        assert_eq!(m.status, MeasurementStatus::Timeout);
        assert_eq!(m.timestamp_us, 42);
    }

    #[test]
    fn out_of_range_distance_skips_smoothing() {
        let clock = FixedClock(Cell::new(0));
        let mut trigger = NoopTrigger { pulses: 0 };
        // A very long echo computes a distance well above MAX_VALID_MM.
        let wait = ScriptedWait::new(vec![Some(RawEcho {
            start_us: 0,
            end_us: 50_000,
        })]);
        let mut prev = Some(300u16);
        let m = process_cycle(&clock, &mut trigger, &wait, &cfg(), &mut prev);
        assert_eq!(m.status, MeasurementStatus::OutOfRange);
        // prev_smoothed untouched by an invalid sample.
        assert_eq!(prev, Some(300));
    }

    #[test]
    fn zero_duration_echo_is_no_echo() {
        let clock = FixedClock(Cell::new(0));
        let mut trigger = NoopTrigger { pulses: 0 };
        let wait = ScriptedWait::new(vec![Some(RawEcho {
            start_us: 10,
            end_us: 10,
        })]);
        let mut prev = None;
        let m = process_cycle(&clock, &mut trigger, &wait, &cfg(), &mut prev);
        assert_eq!(m.status, MeasurementStatus::NoEcho);
    }

    #[test]
    fn consecutive_valid_samples_smooth_per_scenario_2() {
        let clock = FixedClock(Cell::new(0));
        let mut trigger = NoopTrigger { pulses: 0 };
        let mut prev = Some(250u16);
        // Synthesize a duration that resolves to exactly 350mm at 20.0C.
        let dur = distance::dur_us_for(350, 200);
        let wait = ScriptedWait::new(vec![Some(RawEcho {
            start_us: 0,
            end_us: dur,
        })]);
        let m = process_cycle(&clock, &mut trigger, &wait, &cfg(), &mut prev);
        assert_eq!(m.status, MeasurementStatus::Ok);
        assert_eq!(m.distance_mm, 280);
    }

    #[test]
    fn init_clamps_out_of_range_smoothing_factor() {
        let mut c = cfg();
        c.smoothing_factor = 5000;
        let _core = RangingCore::init(&mut c);
        assert_eq!(c.smoothing_factor, 1000);
    }

    #[test]
    fn end_to_end_rising_falling_edge_reaches_raw_queue() {
        let mut c = cfg();
        let core = RangingCore::init(&mut c);
        core.on_rising_edge(100);
        core.on_falling_edge(3100);
        let echo = core.try_recv_raw().unwrap();
        assert_eq!(echo, RawEcho { start_us: 100, end_us: 3100 });
    }

    #[test]
    fn processed_queue_overflow_visible_through_core() {
        let mut c = cfg();
        let core = RangingCore::init(&mut c);
        for i in 0..5u16 {
            core.publish(Measurement {
                distance_mm: i,
                timestamp_us: i as u64,
                status: MeasurementStatus::Ok,
            });
        }
        assert_eq!(core.overflow_count(), 0);
        core.publish(Measurement {
            distance_mm: 99,
            timestamp_us: 99,
            status: MeasurementStatus::Ok,
        });
        assert_eq!(core.overflow_count(), 1);
    }
}
