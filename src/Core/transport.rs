// The one kernel call the async table depends on.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::ASYN::Structs::Message_Structs::ErrorCode;
use crate::ASYN::Table::layout::AsynMsg;

/// The kernel's asynchronous dispatcher, reached through a single handoff.
///
/// After a successful `senda(window)` the dispatcher may, at any time until the
/// next `senda`, read `VALID` slots of `window` and mark them `DONE` with a result.
/// An empty window asks it to stop scanning; once that call returns the dispatcher
/// holds no reference into any earlier window.
pub trait KernelTransport {
    /// Hand `window` to the dispatcher, or pause it when `window` is empty.
    ///
    /// # Safety
    /// The slots of `window` must stay allocated and must not move until the next
    /// call on this transport returns.
    unsafe fn senda(&self, window: &[AsynMsg]) -> Result<(), ErrorCode>;
}

impl<T: KernelTransport + ?Sized> KernelTransport for Box<T> {
    unsafe fn senda(&self, window: &[AsynMsg]) -> Result<(), ErrorCode> {
        (**self).senda(window)
    }
}

impl<T: KernelTransport + ?Sized> KernelTransport for Arc<T> {
    unsafe fn senda(&self, window: &[AsynMsg]) -> Result<(), ErrorCode> {
        (**self).senda(window)
    }
}

impl<T: KernelTransport + ?Sized> KernelTransport for &T {
    unsafe fn senda(&self, window: &[AsynMsg]) -> Result<(), ErrorCode> {
        (**self).senda(window)
    }
}

/// Proof that the dispatcher is paused.
///
/// The only way to get one is a successful zero-length handoff, and it keeps the
/// transport mutably borrowed, so nothing can re-arm the dispatcher while the
/// fence is alive. Slot relocation takes a `&Fence`.
#[derive(Debug)]
pub struct Fence<'t> {
    _transport: PhantomData<&'t mut ()>,
}

impl<'t> Fence<'t> {
    /// Pause the dispatcher behind `transport`.
    pub fn quiesce<T: KernelTransport + ?Sized>(transport: &'t mut T) -> Result<Fence<'t>, ErrorCode> {
        // An empty window references no memory.
        unsafe { transport.senda(&[])? };
        Ok(Fence {
            _transport: PhantomData,
        })
    }
}

#[cfg(feature = "minix")]
pub use self::minix::MinixTransport;

#[cfg(feature = "minix")]
mod minix {
    use std::ptr;

    use super::KernelTransport;
    use crate::ASYN::Structs::Message_Structs::ErrorCode;
    use crate::ASYN::Table::layout::AsynMsg;

    extern "C" {
        fn _ipc_senda_intr(table: *mut AsynMsg, count: libc::size_t) -> libc::c_int;
    }

    /// The real kernel call.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MinixTransport;

    impl KernelTransport for MinixTransport {
        unsafe fn senda(&self, window: &[AsynMsg]) -> Result<(), ErrorCode> {
            let base = if window.is_empty() {
                ptr::null_mut()
            } else {
                window.as_ptr() as *mut AsynMsg
            };
            match _ipc_senda_intr(base, window.len()) {
                0 => Ok(()),
                r => Err(ErrorCode(r)),
            }
        }
    }
}
