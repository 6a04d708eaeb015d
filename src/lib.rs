// Module naming follows project convention (ASYN = asynchronous send table)
#[allow(non_snake_case)]
pub mod ASYN {
    pub mod Table {
        pub mod Table;
        pub mod Table_impl;
        pub mod layout;
        pub use layout::{AsynFlags, AsynMsg, ASYN_NR, NR_PROCS};
        pub use Table::{SlotSnapshot, SlotTable}; // re-export for stable path
    }
    pub mod Structs {
        pub mod Message_Structs;
        pub use Message_Structs::{Endpoint, ErrorCode, ErrorRecord, Message, MSG_PAYLOAD}; // re-export for stable path
    }
    mod builder;
    mod debug;
    pub mod error;
    mod getters;
    pub mod process;
    pub mod sender;

    pub use builder::SenderBuilder;
    pub use error::{AsynError, AsynResult};
    pub use sender::AsyncSender;
}
#[allow(non_snake_case)]
pub mod Core {
    pub mod futex;
    pub mod loopback;
    pub(crate) mod reentry;
    pub mod transport;
    pub use loopback::LoopbackKernel;
    pub use transport::{Fence, KernelTransport};
}
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}

pub mod ffi;

pub use ASYN::process::{asyn_geterror, asynsend, asynsend3};
pub use ASYN::Structs::{Endpoint, ErrorCode, ErrorRecord, Message};
pub use ASYN::Table::AsynFlags;
pub use ASYN::{AsynError, AsynResult, AsyncSender, SenderBuilder};
pub use Core::{KernelTransport, LoopbackKernel};
