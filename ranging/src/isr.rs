//! Edge-capture state, touched only from interrupt context (SPEC_FULL.md §3,
//! §5: "ISR state (start_us, in_progress) — written only from ISR; read only
//! from ISR"). Kept as a narrow, allocation-free, branch-light type so it can
//! sit directly behind a GPIO ISR closure.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::RawEcho;

pub struct IsrState {
    start_us: AtomicU64,
    in_progress: AtomicBool,
}

impl IsrState {
    pub const fn new() -> Self {
        Self {
            start_us: AtomicU64::new(0),
            in_progress: AtomicBool::new(false),
        }
    }

    /// Rising edge: record the start timestamp and mark a measurement in
    /// flight. At most one concurrent measurement (SPEC_FULL.md §3).
    pub fn on_rising_edge(&self, now_us: u64) {
        self.start_us.store(now_us, Ordering::Relaxed);
        self.in_progress.store(true, Ordering::Release);
    }

    /// Falling edge: if a rising edge was recorded, clears `in_progress` and
    /// returns the completed echo. A falling edge with no preceding rising
    /// edge (spurious, or one already consumed) is ignored.
    pub fn on_falling_edge(&self, now_us: u64) -> Option<RawEcho> {
        if self.in_progress.swap(false, Ordering::AcqRel) {
            let start_us = self.start_us.load(Ordering::Relaxed);
            Some(RawEcho {
                start_us,
                end_us: now_us,
            })
        } else {
            None
        }
    }
}

impl Default for IsrState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_then_falling_yields_echo() {
        let isr = IsrState::new();
        isr.on_rising_edge(100);
        let echo = isr.on_falling_edge(150).unwrap();
        assert_eq!(echo, RawEcho { start_us: 100, end_us: 150 });
    }

    #[test]
    fn falling_without_rising_is_ignored() {
        let isr = IsrState::new();
        assert!(isr.on_falling_edge(50).is_none());
    }

    #[test]
    fn falling_clears_in_progress_so_a_second_falling_is_ignored() {
        let isr = IsrState::new();
        isr.on_rising_edge(0);
        assert!(isr.on_falling_edge(10).is_some());
        assert!(isr.on_falling_edge(20).is_none());
    }

    #[test]
    fn new_rising_edge_restarts_the_in_flight_measurement() {
        let isr = IsrState::new();
        isr.on_rising_edge(0);
        isr.on_rising_edge(5); // retrigger before a falling edge arrived
        let echo = isr.on_falling_edge(30).unwrap();
        assert_eq!(echo.start_us, 5);
    }
}
