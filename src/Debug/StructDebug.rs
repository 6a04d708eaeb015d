use std::fmt;

use crate::ASYN::sender::AsyncSender;
use crate::ASYN::Structs::Message_Structs::{Message, MSG_PAYLOAD};
use crate::ASYN::Table::layout::AsynMsg;
use crate::ASYN::Table::SlotTable;
use crate::Core::loopback::LoopbackKernel;
use crate::Core::transport::KernelTransport;

/// Debug function for Message
///
/// Prints the header and only the used prefix of the payload (trailing zeros
/// trimmed), so a 56-byte array does not drown the output.
pub fn debug_message(msg: &Message, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let used = msg
        .payload
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    f.debug_struct("Message")
        .field("m_source", &msg.m_source)
        .field("m_type", &msg.m_type)
        .field("payload", &&msg.payload[..used])
        .field("payload_cap", &MSG_PAYLOAD)
        .finish()
}

/// Debug function for AsynMsg
///
/// Shows only what the kernel may race on (flags and result); the body is not
/// read, since this may be called from either side.
pub fn debug_asynmsg(slot: &AsynMsg, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AsynMsg")
        .field("flags", &slot.flags())
        .field("result", &slot.result())
        .finish_non_exhaustive()
}

/// Debug function for SlotTable
///
/// Shows:
/// - Slot base address
/// - Cursors and capacity
pub fn debug_slot_table<const N: usize>(table: &SlotTable<N>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SlotTable")
        .field("base", &format_args!("{:p}", table.base.as_ptr()))
        .field("first", &table.first())
        .field("next", &table.next())
        .field("capacity", &N)
        .finish()
}

/// Debug function for AsyncSender
///
/// The transport is opaque; the table is shown only once allocated.
pub fn debug_async_sender<T: KernelTransport, const N: usize>(
    sender: &AsyncSender<T, N>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("AsyncSender")
        .field("transport", &"<opaque>")
        .field("table", &sender.table)
        .finish()
}

/// Debug function for LoopbackKernel
pub fn debug_loopback_kernel(kernel: &LoopbackKernel, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoopbackKernel")
        .field("window_len", &kernel.window_len())
        .field("handoffs", &kernel.handoffs())
        .field("pauses", &kernel.pauses())
        .field("delivered", &kernel.delivered())
        .field("stopped", &kernel.is_stopped())
        .finish()
}
