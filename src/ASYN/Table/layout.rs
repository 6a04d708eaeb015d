use std::cell::UnsafeCell;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{AtomicI32, AtomicU32};

use bitflags::bitflags;

use crate::ASYN::Structs::Message_Structs::{Endpoint, ErrorCode, Message};

/// Largest number of processes the kernel schedules.
pub const NR_PROCS: usize = 256;

/// Slots in the process-wide table: one outstanding message per possible
/// destination, plus the same again as slack.
pub const ASYN_NR: usize = 2 * NR_PROCS;

bitflags! {
    /// Slot state bits shared with the kernel.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AsynFlags: u32 {
        /// Slot holds a message.
        const VALID = 0o001;
        /// Kernel has processed the message; the outcome is in `result`.
        const DONE = 0o002;
        /// Notify the sender when DONE is set.
        const NOTIFY = 0o004;
        /// Not a reply to a SENDREC.
        const NOREPLY = 0o010;
        /// Notify the sender when DONE is set and delivery failed.
        const NOTIFY_ERR = 0o020;
    }
}

impl AsynFlags {
    /// A slot that is not in use.
    pub const EMPTY: AsynFlags = AsynFlags::empty();

    /// Bits a sender may request.
    pub const USER: AsynFlags = AsynFlags::NOTIFY
        .union(AsynFlags::NOREPLY)
        .union(AsynFlags::NOTIFY_ERR);

    /// `VALID | DONE`: the kernel has finished with this slot.
    pub const COMPLETE: AsynFlags = AsynFlags::VALID.union(AsynFlags::DONE);
}

/// One entry of the asynchronous send table.
///
/// Bit-identical to the kernel's `asynmsg_t`. The kernel scans these in place and
/// writes `result` and then `DONE` whenever it gets around to a slot, so the two
/// fields it touches are atomics. `dst` and `msg` are only written by the owning
/// process, and only while the kernel cannot be reading them: before `VALID` is
/// published, or behind a pause.
#[repr(C)]
pub struct AsynMsg {
    pub(crate) flags: AtomicU32,
    pub(crate) dst: UnsafeCell<Endpoint>,
    pub(crate) result: AtomicI32,
    pub(crate) msg: UnsafeCell<Message>,
}

// Cross-thread access follows the publish protocol documented above.
unsafe impl Sync for AsynMsg {}
unsafe impl Send for AsynMsg {}

impl AsynMsg {
    pub const fn empty() -> Self {
        AsynMsg {
            flags: AtomicU32::new(0),
            dst: UnsafeCell::new(Endpoint(0)),
            result: AtomicI32::new(0),
            msg: UnsafeCell::new(Message::with_type(0)),
        }
    }

    #[inline]
    pub fn flags(&self) -> AsynFlags {
        AsynFlags::from_bits_retain(self.flags.load(Acquire))
    }

    #[inline]
    pub fn result(&self) -> ErrorCode {
        ErrorCode(self.result.load(Relaxed))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags() == AsynFlags::EMPTY
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.flags().contains(AsynFlags::COMPLETE)
    }

    /// Failed, asked for error notification, and nobody has polled it yet.
    pub fn awaits_drain(&self) -> bool {
        let flags = self.flags();
        flags.contains(AsynFlags::COMPLETE)
            && flags.contains(AsynFlags::NOTIFY_ERR)
            && !self.result().is_ok()
    }

    /// Whether compaction may drop this slot.
    pub fn is_retired(&self) -> bool {
        let flags = self.flags();
        if flags == AsynFlags::EMPTY {
            return true;
        }
        flags.contains(AsynFlags::COMPLETE)
            && (self.result().is_ok() || !flags.contains(AsynFlags::NOTIFY_ERR))
    }

    /// Kernel side: record the outcome and mark the slot done.
    pub fn complete(&self, result: ErrorCode) {
        self.result.store(result.0, Relaxed);
        self.flags.fetch_or(AsynFlags::DONE.bits(), Release);
    }

    /// Read the addressed message.
    ///
    /// # Safety
    /// The owner must not be rewriting this slot concurrently, i.e. the caller has
    /// observed `VALID` with acquire ordering and the slot is inside the window most
    /// recently handed to the kernel.
    pub unsafe fn read(&self) -> (Endpoint, Message) {
        (*self.dst.get(), *self.msg.get())
    }

    /// Owner side: fill the slot and publish it as `VALID | flags`.
    ///
    /// # Safety
    /// The slot must be outside the window the kernel may currently scan, or the
    /// kernel must be paused.
    pub(crate) unsafe fn publish(&self, dst: Endpoint, msg: &Message, flags: AsynFlags) {
        *self.dst.get() = dst;
        *self.msg.get() = *msg;
        self.result.store(ErrorCode::OK.0, Relaxed);
        self.flags.store((flags | AsynFlags::VALID).bits(), Release);
    }

    /// Owner side: move `src` into this slot, flags last.
    ///
    /// # Safety
    /// The kernel must be paused.
    pub(crate) unsafe fn copy_from(&self, src: &AsynMsg) {
        *self.dst.get() = *src.dst.get();
        *self.msg.get() = *src.msg.get();
        self.result.store(src.result.load(Relaxed), Relaxed);
        self.flags.store(src.flags.load(Relaxed), Release);
    }

    pub(crate) fn clear(&self) {
        self.flags.store(AsynFlags::EMPTY.bits(), Release);
    }

    /// Owner side: acknowledge a reported failure so the slot can retire.
    pub(crate) fn drain(&self) {
        self.result.store(ErrorCode::OK.0, Relaxed);
    }
}

impl Default for AsynMsg {
    fn default() -> Self {
        AsynMsg::empty()
    }
}
