use super::sender::AsyncSender;
use crate::ASYN::Table::SlotSnapshot;
use crate::Core::transport::KernelTransport;

/// Read-only accessors for AsyncSender
///
/// Meant for tests, debugging and monitoring. None of these touch the kernel.
impl<T: KernelTransport, const N: usize> AsyncSender<T, N> {
    /// Table capacity, fixed at build time.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether the table has been allocated yet.
    pub fn is_initialized(&self) -> bool {
        self.table.is_some()
    }

    /// Start of the active window (0 before the first send).
    pub fn first(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.first())
    }

    /// End of the active window (0 before the first send).
    pub fn next(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.next())
    }

    /// Messages the kernel has not completed yet.
    pub fn outstanding(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.outstanding())
    }

    /// Failures waiting for `poll_error`.
    pub fn undrained(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.undrained())
    }

    /// Owner-side copy of slot `index`.
    pub fn slot(&self, index: usize) -> Option<SlotSnapshot> {
        self.table.as_ref()?.snapshot(index)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
