// The pending-message table a process shares with the kernel's async dispatcher.

use std::ptr::NonNull;

use super::layout::{AsynFlags, AsynMsg};
use crate::ASYN::Structs::Message_Structs::{Endpoint, ErrorCode, Message};

/// Fixed-capacity, ordered table of async send slots.
///
/// The slots live in one heap allocation that never moves for the lifetime of the
/// table, because the kernel keeps a pointer into it between handoffs.
///
/// ### Cursors
/// - `first`: oldest slot that may still matter to the kernel or to the owner.
/// - `next`: where the next message goes.
///
/// `[first, next)` is the active window and the only range ever handed to the
/// kernel. `0 <= first <= next <= N` holds after every operation.
///
/// Only an [`AsyncSender`](crate::ASYN::AsyncSender) builds or mutates a table, so a
/// compaction fence always comes from the transport holding this window.
///
/// ```compile_fail
/// use asyn_ipc::ASYN::Table::SlotTable;
///
/// let table: SlotTable<4> = SlotTable::new();
/// ```
pub struct SlotTable<const N: usize> {
    /// Start of the `N` slots. Owned; freed on drop.
    pub(crate) base: NonNull<AsynMsg>,

    pub(crate) first: usize,

    pub(crate) next: usize,
}

// The table is owned by a single sender; the kernel's concurrent access goes
// through the atomics inside each slot.
unsafe impl<const N: usize> Send for SlotTable<N> {}

/// Owner-side copy of one slot, for inspection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub dst: Endpoint,
    pub msg: Message,
    pub flags: AsynFlags,
    pub result: ErrorCode,
}
