// In src/ASYN/sender.rs
use std::fmt;
use std::process;

use log::{debug, error, trace, warn};

use crate::ASYN::error::{AsynError, AsynResult};
use crate::ASYN::Structs::Message_Structs::{Endpoint, ErrorRecord, Message};
use crate::ASYN::Table::layout::{AsynFlags, ASYN_NR};
use crate::ASYN::Table::SlotTable;
use crate::Core::transport::{Fence, KernelTransport};

/// Fire-and-forget sender over one async table.
///
/// `send` queues a message and re-publishes the table to the kernel; it only
/// reports whether the kernel accepted the table, never whether the message got
/// through. Failures come back through `poll_error`, and only for messages sent
/// with `NOTIFY_ERR`.
///
/// The table is allocated on the first send unless the builder asked for it up
/// front. `N` is the table capacity.
pub struct AsyncSender<T: KernelTransport, const N: usize = ASYN_NR> {
    pub(crate) transport: T,
    pub(crate) table: Option<SlotTable<N>>,
}

impl<T: KernelTransport> AsyncSender<T, ASYN_NR> {
    /// A sender with the default capacity and a lazily allocated table.
    pub fn new(transport: T) -> Self {
        super::SenderBuilder::new(transport).build()
    }
}

impl<T: KernelTransport, const N: usize> AsyncSender<T, N> {
    pub(crate) fn from_parts(transport: T, table: Option<SlotTable<N>>) -> Self {
        Self { transport, table }
    }

    /// Queue `msg` for `dst` and hand the active window to the kernel.
    ///
    /// May retire earlier slots that completed and need no further attention.
    ///
    /// # Aborts
    /// The process, without unwinding, if the kernel refuses to pause when the
    /// table is full, or if the table is still full after compaction because
    /// failures were never polled.
    pub fn send(&mut self, dst: Endpoint, msg: &Message, flags: AsynFlags) -> AsynResult<()> {
        if !AsynFlags::USER.contains(flags) {
            return Err(AsynError::InvalidFlags(flags.bits()));
        }

        let table = self.table.get_or_insert_with(SlotTable::new);

        table.advance_first();
        table.reset_if_idle();

        if table.is_full() {
            let fence = match Fence::quiesce(&mut self.transport) {
                Ok(fence) => fence,
                Err(code) => {
                    error!("asynsend: kernel refused to pause the async table: {code}");
                    fatal(format_args!("asynsend: senda pause failed: {code}"));
                }
            };
            table.compact(&fence);
            drop(fence);

            if table.is_full() {
                error!(
                    "asynsend: {} slots still live after compaction, {} of them undrained failures",
                    N,
                    table.undrained()
                );
                fatal(format_args!("asynsend: msgtable full"));
            }
        }

        table.push(dst, msg, flags);
        trace!(
            "asynsend to {dst}: window [{}, {})",
            table.first(),
            table.next()
        );

        // The table's allocation is stable and outlives every handoff: the next
        // handoff or the pause in `Drop` always comes before it is freed.
        match unsafe { self.transport.senda(table.active()) } {
            Ok(()) => Ok(()),
            Err(code) => {
                warn!("asynsend to {dst}: kernel refused the table: {code}");
                Err(AsynError::Handoff(code))
            }
        }
    }

    /// Report one undelivered message that was sent with `NOTIFY_ERR`.
    ///
    /// Each failure is returned once; afterwards its slot retires like a delivered
    /// one. Never blocks and never moves the cursors.
    pub fn poll_error(&mut self) -> Option<ErrorRecord> {
        let record = self.table.as_mut()?.take_error()?;
        debug!("asynsend to {} failed: {}", record.dst, record.result);
        Some(record)
    }

    /// Drain every failure currently waiting to be reported.
    pub fn drain_errors(&mut self) -> impl Iterator<Item = ErrorRecord> + '_ {
        std::iter::from_fn(move || self.poll_error())
    }
}

/// The slots may still be in the kernel's hands, so nothing may run after this:
/// no unwinding, no destructors.
#[cold]
fn fatal(reason: fmt::Arguments<'_>) -> ! {
    eprintln!("{reason}");
    process::abort()
}

impl<T: KernelTransport, const N: usize> Drop for AsyncSender<T, N> {
    fn drop(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        match unsafe { self.transport.senda(&[]) } {
            Ok(()) => drop(table),
            Err(code) => {
                // The kernel may still be looking at the slots.
                warn!("async sender dropped but the kernel refused to pause ({code}); leaking table");
                std::mem::forget(table);
            }
        }
    }
}
