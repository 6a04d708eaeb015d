use std::ptr::{self, NonNull};
use std::slice;

use log::debug;

use super::layout::{AsynFlags, AsynMsg};
use super::Table::{SlotSnapshot, SlotTable};
use crate::ASYN::Structs::Message_Structs::{Endpoint, ErrorRecord, Message};
use crate::Core::transport::Fence;

impl<const N: usize> SlotTable<N> {
    /// Allocate `N` empty slots.
    pub(crate) fn new() -> Self {
        assert!(N > 0, "async table needs at least one slot");

        let slots: Box<[AsynMsg]> = (0..N).map(|_| AsynMsg::empty()).collect();
        let raw = Box::into_raw(slots) as *mut AsynMsg;
        // Box never hands out null.
        let base = unsafe { NonNull::new_unchecked(raw) };

        Self {
            base,
            first: 0,
            next: 0,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn first(&self) -> usize {
        self.first
    }

    #[inline]
    pub fn next(&self) -> usize {
        self.next
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.next == N
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> &AsynMsg {
        debug_assert!(index < N);
        unsafe { &*self.base.as_ptr().add(index) }
    }

    #[inline]
    fn slots(&self) -> &[AsynMsg] {
        unsafe { slice::from_raw_parts(self.base.as_ptr(), N) }
    }

    /// The window `[first, next)` to hand to the kernel.
    pub fn active(&self) -> &[AsynMsg] {
        &self.slots()[self.first..self.next]
    }

    /// Move `first` past every slot at the head of the window that the kernel has
    /// finished with and that nobody needs to see again.
    ///
    /// Stops at the first slot still in flight, and at a failure that is waiting to
    /// be polled. Returns `true` in the latter case.
    pub(crate) fn advance_first(&mut self) -> bool {
        while self.first < self.next {
            let slot = self.slot(self.first);
            if slot.is_empty() {
                self.first += 1;
                continue;
            }
            if !slot.is_complete() {
                break;
            }
            if slot.awaits_drain() {
                self.check_cursors();
                return true;
            }
            self.first += 1;
        }
        self.check_cursors();
        false
    }

    /// Rewind both cursors to zero once the window is empty.
    ///
    /// `advance_first` never steps over an undrained failure, so an empty window
    /// means there is none left in the table either.
    pub(crate) fn reset_if_idle(&mut self) -> bool {
        if self.first != self.next || self.next == 0 {
            return false;
        }
        debug!("async table idle at {}, rewinding", self.next);
        self.first = 0;
        self.next = 0;
        true
    }

    /// Squeeze retired slots out of the window, keeping the survivors in order, and
    /// rebase the window at slot 0. Returns how many slots were retired.
    ///
    /// Only sound while the kernel is paused, hence the fence.
    pub(crate) fn compact(&mut self, _fence: &Fence<'_>) -> usize {
        let mut dst_ind = 0;
        for src_ind in self.first..self.next {
            let src = self.slot(src_ind);
            if src.is_retired() {
                continue;
            }
            if src_ind != dst_ind {
                // dst_ind < src_ind, and the kernel is not looking.
                unsafe { self.slot(dst_ind).copy_from(src) };
            }
            dst_ind += 1;
        }

        let retired = self.next - self.first - dst_ind;
        for index in dst_ind..N {
            self.slot(index).clear();
        }
        self.first = 0;
        self.next = dst_ind;
        self.check_cursors();

        debug!("async table compacted: {retired} retired, {dst_ind} kept");
        retired
    }

    /// Append a message at `next`. The caller has made room.
    pub(crate) fn push(&mut self, dst: Endpoint, msg: &Message, flags: AsynFlags) {
        assert!(!self.is_full(), "asynsend: push into a full table");

        // `next` is either past the last window handed out, or every slot of that
        // window was complete, and the kernel never reads a complete slot's body.
        unsafe { self.slot(self.next).publish(dst, msg, flags) };
        self.next += 1;
        self.check_cursors();
    }

    /// Find the oldest failure still waiting to be reported, mark it drained and
    /// return a copy. Cursors are left alone.
    pub(crate) fn take_error(&mut self) -> Option<ErrorRecord> {
        for index in 0..self.next {
            let slot = self.slot(index);
            if !slot.awaits_drain() {
                continue;
            }
            let result = slot.result();
            // The kernel never writes the body; only the owner does.
            let (dst, msg) = unsafe { slot.read() };
            slot.drain();
            return Some(ErrorRecord { dst, msg, result });
        }
        None
    }

    /// Slots in the window the kernel has not finished with.
    pub fn outstanding(&self) -> usize {
        self.active()
            .iter()
            .filter(|slot| slot.flags().contains(AsynFlags::VALID) && !slot.is_complete())
            .count()
    }

    /// Failures waiting for `take_error`.
    pub fn undrained(&self) -> usize {
        self.slots()[..self.next]
            .iter()
            .filter(|slot| slot.awaits_drain())
            .count()
    }

    /// Copy of slot `index` as the owner sees it.
    pub fn snapshot(&self, index: usize) -> Option<SlotSnapshot> {
        if index >= N {
            return None;
        }
        let slot = self.slot(index);
        let flags = slot.flags();
        let result = slot.result();
        let (dst, msg) = unsafe { slot.read() };
        Some(SlotSnapshot {
            dst,
            msg,
            flags,
            result,
        })
    }

    #[inline]
    fn check_cursors(&self) {
        debug_assert!(
            self.first <= self.next && self.next <= N,
            "async table cursors out of range: first={} next={} capacity={}",
            self.first,
            self.next,
            N
        );
    }
}

impl<const N: usize> Drop for SlotTable<N> {
    fn drop(&mut self) {
        unsafe {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                self.base.as_ptr(),
                N,
            )));
        }
    }
}
