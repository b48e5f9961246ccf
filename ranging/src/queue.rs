//! The two bounded channels sitting between the edge ISR, the ranging
//! worker, and the display compositor (SPEC_FULL.md §4.1, §3 invariants).
//!
//! `RawQueue` is the ISR-to-worker handoff: lock-free, single-producer
//! single-consumer, non-blocking on both ends, because the producer runs in
//! interrupt context and must never block. `ProcessedQueue` is the
//! worker-to-compositor handoff: lossy-newest with a drop counter, guarded by
//! an ordinary mutex since its only producer is a cooperative task.

use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use crate::RawEcho;

/// Lock-free bounded SPSC ring buffer, usable capacity `N - 1` (one slot is
/// always kept empty to distinguish full from empty). SPEC_FULL.md's "raw
/// channel capacity 2" is `RawQueue<3>`.
pub struct RawQueue<const N: usize> {
    buf: [UnsafeCell<MaybeUninit<RawEcho>>; N],
    head: AtomicUsize,
    tail: AtomicUsize,
}

// Safety: `head`/`tail` establish a single-producer-single-consumer
// happens-before relationship over the slot each index claims; no two
// threads ever touch the same slot concurrently.
unsafe impl<const N: usize> Sync for RawQueue<N> {}

impl<const N: usize> RawQueue<N> {
    pub fn new() -> Self {
        Self {
            buf: std::array::from_fn(|_| UnsafeCell::new(MaybeUninit::uninit())),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Producer side (ISR-safe): never blocks, never allocates. Returns
    /// `false` if the queue is full.
    pub fn try_send(&self, echo: RawEcho) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }
        // Safety: only the producer writes slot `head`, and the consumer
        // cannot read it until `head` is published below.
        unsafe { (*self.buf[head].get()).write(echo) };
        self.head.store(next, Ordering::Release);
        true
    }

    /// Consumer side: non-blocking poll.
    pub fn try_recv(&self) -> Option<RawEcho> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        // Safety: slot `tail` was published by the producer and is not
        // touched again until `tail` advances below.
        let echo = unsafe { (*self.buf[tail].get()).assume_init_read() };
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(echo)
    }
}

impl<const N: usize> Default for RawQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lossy-newest bounded channel: `push` on a full queue drops the oldest
/// entry and increments `overflow_count` (SPEC_FULL.md §3 invariant).
/// `pop_blocking` waits indefinitely for an item (consumers want freshest
/// data, never a timeout); `try_pop` is non-blocking.
pub struct ProcessedQueue<T> {
    capacity: usize,
    state: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    overflow_count: AtomicU64,
}

impl<T> ProcessedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "processed queue capacity must be nonzero");
        Self {
            capacity,
            state: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            overflow_count: AtomicU64::new(0),
        }
    }

    pub fn push(&self, item: T) {
        let mut q = self.state.lock().expect("processed queue mutex poisoned");
        if q.len() == self.capacity {
            q.pop_front();
            self.overflow_count.fetch_add(1, Ordering::Relaxed);
        }
        q.push_back(item);
        self.not_empty.notify_one();
    }

    /// Blocks indefinitely until an item is available.
    pub fn pop_blocking(&self) -> T {
        let mut q = self.state.lock().expect("processed queue mutex poisoned");
        loop {
            if let Some(item) = q.pop_front() {
                return item;
            }
            q = self
                .not_empty
                .wait(q)
                .expect("processed queue mutex poisoned");
        }
    }

    pub fn has_new(&self) -> bool {
        !self
            .state
            .lock()
            .expect("processed queue mutex poisoned")
            .is_empty()
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflow_count.load(Ordering::Relaxed)
    }
}
