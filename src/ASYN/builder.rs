use super::sender::AsyncSender;
use crate::ASYN::Table::layout::ASYN_NR;
use crate::ASYN::Table::SlotTable;
use crate::Core::transport::KernelTransport;

pub struct SenderBuilder<T: KernelTransport, const N: usize = ASYN_NR> {
    transport: T,
    eager_table: bool,
}

impl<T: KernelTransport, const N: usize> SenderBuilder<T, N> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            eager_table: false,
        }
    }

    /// Allocate the table in `build` instead of on the first send.
    pub fn with_eager_table(mut self, eager: bool) -> Self {
        self.eager_table = eager;
        self
    }

    pub fn build(self) -> AsyncSender<T, N> {
        let table = self.eager_table.then(SlotTable::new);
        AsyncSender::from_parts(self.transport, table)
    }
}
