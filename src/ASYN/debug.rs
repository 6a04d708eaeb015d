use std::fmt;

use super::sender::AsyncSender;
use crate::ASYN::Table::layout::AsynMsg;
use crate::ASYN::Table::SlotTable;
use crate::Core::loopback::LoopbackKernel;
use crate::Core::transport::KernelTransport;

// Debug proxy implementations that call the standalone debug functions
impl fmt::Debug for AsynMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_asynmsg(self, f)
    }
}

impl<const N: usize> fmt::Debug for SlotTable<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_slot_table(self, f)
    }
}

impl<T: KernelTransport, const N: usize> fmt::Debug for AsyncSender<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_async_sender(self, f)
    }
}

impl fmt::Debug for LoopbackKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_loopback_kernel(self, f)
    }
}
