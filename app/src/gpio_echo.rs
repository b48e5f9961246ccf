//! Hardware wiring for the ranging core's trigger/echo lines: `esp-idf-hal`
//! `PinDriver`s, a `gpio_isr_handler_add` edge handler, and the `Clock` /
//! `Trigger` / `EchoWait` glue `ranging::run_worker` needs. Grounded in
//! `viamrobotics-micro-rdk`'s HC-SR04 driver (ISR registration, `AnyEdge`
//! interrupt, `Notification`-based handoff).

use std::sync::Arc;
use std::time::Duration;

use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{
    enable_isr_service, init_isr_alloc_flags, AnyIOPin, Input, InterruptType, Output, PinDriver,
};
use esp_idf_hal::task::notification::Notification;
use esp_idf_sys::{esp, esp_timer_get_time, gpio_isr_handler_add};

use ranging::{Clock, RangingCore, Trigger};

use crate::error::Error;

/// Microsecond clock backed by `esp_timer_get_time` (SPEC_FULL.md §2 L1
/// "Time source": a monotonic microsecond counter).
pub struct EspClock;

impl Clock for EspClock {
    fn now_us(&self) -> u64 {
        unsafe { esp_timer_get_time() as u64 }
    }
}

/// Drives the HC-SR04-style trigger pin through the step-1 pulse: high, busy
/// 10 µs, low (SPEC_FULL.md §4.1 worker contract step 1 — the only
/// permissible busy-wait in the ranging core).
pub struct EspTrigger {
    pin: PinDriver<'static, AnyIOPin, Output>,
}

impl Trigger for EspTrigger {
    fn pulse(&mut self) {
        let _ = self.pin.set_high();
        Ets::delay_us(10);
        let _ = self.pin.set_low();
    }
}

/// `wait()` drains the ISR's raw queue through a shared `RangingCore`,
/// blocking on a `Notification` the ISR signals on every falling edge.
/// Mirrors the "await with timeout" suspension point of SPEC_FULL.md §5.
pub struct EspEchoWait {
    core: Arc<RangingCore>,
    notification: Notification,
}

impl ranging::EchoWait for EspEchoWait {
    fn wait(&self, timeout: Duration) -> Option<ranging::RawEcho> {
        let timeout_ms = timeout.as_millis().max(1) as u32;
        self.notification.wait(timeout_ms)?;
        self.core.try_recv_raw()
    }
}

struct IsrContext {
    core: Arc<RangingCore>,
    notifier: Arc<esp_idf_hal::task::notification::Notifier>,
    echo_pin_num: i32,
}

/// Installs the any-edge echo interrupt and returns the trigger/wait
/// handles `ranging::run_worker` needs, plus the `RangingCore` they and the
/// worker share.
pub fn install(
    trigger_pin: AnyIOPin,
    echo_pin: AnyIOPin,
    mut cfg: ranging::SensorConfig,
) -> Result<(Arc<RangingCore>, EspTrigger, EspEchoWait), Error> {
    let core = Arc::new(RangingCore::init(&mut cfg));

    let mut trigger = PinDriver::output(trigger_pin)?;
    trigger.set_low()?;

    let mut echo = PinDriver::input(echo_pin)?;
    echo.set_interrupt_type(InterruptType::AnyEdge)?;

    init_isr_alloc_flags(esp_idf_hal::interrupt::InterruptType::Iram.into());
    enable_isr_service()?;

    let notification = Notification::new();
    let notifier = notification.notifier();
    let echo_pin_num = echo.pin();
    let ctx = Box::into_raw(Box::new(IsrContext {
        core: core.clone(),
        notifier,
        echo_pin_num,
    }));

    unsafe {
        esp!(gpio_isr_handler_add(
            echo_pin_num,
            Some(echo_isr),
            ctx as *mut _,
        ))?;
    }
    // `echo` (and its interrupt registration) must outlive the ISR; leak it
    // deliberately the way the teacher's pin drivers live for `'static`.
    std::mem::forget(echo);

    Ok((
        core.clone(),
        EspTrigger { pin: trigger },
        EspEchoWait { core, notification },
    ))
}

#[link_section = ".iram1.intr_srv"]
unsafe extern "C" fn echo_isr(arg: *mut core::ffi::c_void) {
    let ctx: &IsrContext = &*(arg as *const IsrContext);
    let now = esp_timer_get_time() as u64;
    // AnyEdge fires once per edge; a direct level read (not the PinDriver,
    // which was forgotten so the ISR alone owns the pin) tells rising from
    // falling.
    if esp_idf_sys::gpio_get_level(ctx.echo_pin_num) != 0 {
        ctx.core.on_rising_edge(now);
    } else {
        ctx.core.on_falling_edge(now);
        ctx.notifier.notify_and_yield(1.try_into().unwrap());
    }
}
