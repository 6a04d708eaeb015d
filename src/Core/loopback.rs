// An in-process stand-in for the kernel's asynchronous dispatcher.

use std::ptr;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64};
use std::time::Duration;

use crossbeam_utils::{Backoff, CachePadded};
use log::trace;
use parking_lot::Mutex;

use super::futex::{doorbell_ring, doorbell_wait};
use super::transport::KernelTransport;
use crate::ASYN::Structs::Message_Structs::{Endpoint, ErrorCode, Message};
use crate::ASYN::Table::layout::{AsynFlags, AsynMsg};

/// How long an idle dispatcher sleeps before rescanning on its own.
const IDLE_WAIT: Duration = Duration::from_millis(10);

/// The window most recently handed over, kept as raw parts.
pub(crate) struct Window {
    pub(crate) base: *const AsynMsg,
    pub(crate) count: usize,
}

// Only dereferenced under the kernel's mutex, within the handoff contract.
unsafe impl Send for Window {}

impl Window {
    const CLOSED: Window = Window {
        base: ptr::null(),
        count: 0,
    };
}

/// Loopback dispatcher.
///
/// Behaves like the kernel side of `senda`: it remembers the last published
/// window and, whenever `deliver` runs, walks it and completes every `VALID` slot
/// the routing function accepts. Scanning and handoffs serialize on one mutex, so
/// a successful pause really is a barrier.
pub struct LoopbackKernel {
    pub(crate) window: Mutex<Window>,

    /// Bumped on every non-empty handoff; a dispatcher thread sleeps on it.
    pub(crate) doorbell: CachePadded<AtomicU32>,

    stopped: AtomicBool,

    handoffs: AtomicU64,
    pauses: AtomicU64,
    delivered: AtomicU64,

    /// Status returned by the next pause / handoff requests. Fault injection.
    pause_status: AtomicI32,
    handoff_status: AtomicI32,
}

impl LoopbackKernel {
    pub fn new() -> Self {
        Self {
            window: Mutex::new(Window::CLOSED),
            doorbell: CachePadded::new(AtomicU32::new(0)),
            stopped: AtomicBool::new(false),
            handoffs: AtomicU64::new(0),
            pauses: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            pause_status: AtomicI32::new(0),
            handoff_status: AtomicI32::new(0),
        }
    }

    /// Walk the current window once.
    ///
    /// `route` decides each pending message's fate: `Some(code)` completes it with
    /// `code`, `None` leaves it pending, as when the receiver is not ready yet.
    /// Returns how many slots were completed. `route` runs with the kernel locked
    /// and must not send through this kernel.
    pub fn deliver<F>(&self, mut route: F) -> usize
    where
        F: FnMut(Endpoint, &Message) -> Option<ErrorCode>,
    {
        let window = self.window.lock();
        let mut completed = 0;

        for index in 0..window.count {
            // The sender keeps the window alive until its next handoff, which
            // needs this lock.
            let slot = unsafe { &*window.base.add(index) };
            let flags = slot.flags();
            if !flags.contains(AsynFlags::VALID) || flags.contains(AsynFlags::DONE) {
                continue;
            }
            let (dst, msg) = unsafe { slot.read() };
            if let Some(result) = route(dst, &msg) {
                slot.complete(result);
                completed += 1;
            }
        }

        if completed > 0 {
            self.delivered.fetch_add(completed as u64, Relaxed);
            trace!("loopback delivered {completed} of {} slots", window.count);
        }
        completed
    }

    /// Dispatcher loop for a dedicated thread; returns after `shutdown`.
    pub fn run<F>(&self, mut route: F)
    where
        F: FnMut(Endpoint, &Message) -> Option<ErrorCode>,
    {
        let backoff = Backoff::new();
        while !self.stopped.load(Acquire) {
            let seen = self.doorbell.load(Acquire);
            if self.deliver(&mut route) > 0 {
                backoff.reset();
                continue;
            }
            if backoff.is_completed() {
                doorbell_wait(&self.doorbell, seen, Some(IDLE_WAIT));
                backoff.reset();
            } else {
                backoff.snooze();
            }
        }
    }

    /// Stop a `run` loop.
    pub fn shutdown(&self) {
        self.stopped.store(true, Release);
        doorbell_ring(&self.doorbell);
    }

    /// Make pause requests fail with `status` (or succeed again with `OK`).
    pub fn set_pause_status(&self, status: ErrorCode) {
        self.pause_status.store(status.0, Relaxed);
    }

    /// Make non-empty handoffs fail with `status` (or succeed again with `OK`).
    pub fn set_handoff_status(&self, status: ErrorCode) {
        self.handoff_status.store(status.0, Relaxed);
    }

    pub fn handoffs(&self) -> u64 {
        self.handoffs.load(Relaxed)
    }

    pub fn pauses(&self) -> u64 {
        self.pauses.load(Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Relaxed)
    }

    /// Length of the window currently held, zero while paused.
    pub fn window_len(&self) -> usize {
        self.window.lock().count
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Acquire)
    }
}

impl Default for LoopbackKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelTransport for LoopbackKernel {
    unsafe fn senda(&self, window: &[AsynMsg]) -> Result<(), ErrorCode> {
        if window.is_empty() {
            self.pauses.fetch_add(1, Relaxed);
            let status = ErrorCode(self.pause_status.load(Relaxed));
            if !status.is_ok() {
                return Err(status);
            }
            *self.window.lock() = Window::CLOSED;
            return Ok(());
        }

        self.handoffs.fetch_add(1, AcqRel);
        let status = ErrorCode(self.handoff_status.load(Relaxed));
        if !status.is_ok() {
            // A refused table is forgotten, as the kernel does.
            *self.window.lock() = Window::CLOSED;
            return Err(status);
        }

        *self.window.lock() = Window {
            base: window.as_ptr(),
            count: window.len(),
        };
        trace!("loopback armed with {} slots", window.len());
        doorbell_ring(&self.doorbell);
        Ok(())
    }
}
