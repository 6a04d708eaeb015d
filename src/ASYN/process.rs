//! Process-wide async table.
//!
//! A process has exactly one table shared with the kernel. These functions own it:
//! install a transport once, then call `asynsend3` and `asyn_geterror` from
//! anywhere. The table is allocated on the first send and lives until the process
//! exits.

use lazy_static::lazy_static;
use parking_lot::Mutex;

use super::sender::AsyncSender;
use crate::ASYN::error::{AsynError, AsynResult};
use crate::ASYN::Structs::Message_Structs::{Endpoint, ErrorRecord, Message};
use crate::ASYN::Table::layout::AsynFlags;
use crate::Core::reentry::ReentryGuard;
use crate::Core::transport::KernelTransport;

/// The sender behind the process table.
pub type ProcessSender = AsyncSender<Box<dyn KernelTransport + Send>>;

lazy_static! {
    static ref PROCESS_SENDER: Mutex<Option<ProcessSender>> = Mutex::new(None);
}

/// Bind the process table to `transport`. Only the first call wins.
pub fn install<T>(transport: T) -> AsynResult<()>
where
    T: KernelTransport + Send + 'static,
{
    let _guard = ReentryGuard::enter("asyn install");
    let mut slot = PROCESS_SENDER.lock();
    if slot.is_some() {
        return Err(AsynError::AlreadyInstalled);
    }
    let transport: Box<dyn KernelTransport + Send> = Box::new(transport);
    *slot = Some(AsyncSender::new(transport));
    Ok(())
}

pub fn is_installed() -> bool {
    let _guard = ReentryGuard::enter("asyn inspect");
    PROCESS_SENDER.lock().is_some()
}

/// True while this thread is inside `asynsend3` or `asyn_geterror`. Loggers that
/// forward over IPC should check this before sending.
pub fn in_asynsend() -> bool {
    ReentryGuard::is_held()
}

/// `asynsend3(dst, msg, 0)`.
pub fn asynsend(dst: Endpoint, msg: &Message) -> AsynResult<()> {
    asynsend3(dst, msg, AsynFlags::EMPTY)
}

/// Queue `msg` for `dst` on the process table.
///
/// # Panics
/// On re-entry from the same thread. The fatal paths of [`AsyncSender::send`]
/// abort the process.
pub fn asynsend3(dst: Endpoint, msg: &Message, flags: AsynFlags) -> AsynResult<()> {
    let _guard = ReentryGuard::enter("asynsend");
    let mut slot = PROCESS_SENDER.lock();

    #[cfg(feature = "minix")]
    if slot.is_none() {
        let transport: Box<dyn KernelTransport + Send> =
            Box::new(crate::Core::transport::MinixTransport);
        *slot = Some(AsyncSender::new(transport));
    }

    let sender = slot.as_mut().ok_or(AsynError::NoTransport)?;
    sender.send(dst, msg, flags)
}

/// Next failure reported by the kernel for a `NOTIFY_ERR` send, if any.
pub fn asyn_geterror() -> Option<ErrorRecord> {
    let _guard = ReentryGuard::enter("asyn_geterror");
    PROCESS_SENDER.lock().as_mut()?.poll_error()
}

/// Run `f` against the process sender, for inspection.
pub fn with_sender<R>(f: impl FnOnce(Option<&ProcessSender>) -> R) -> R {
    let _guard = ReentryGuard::enter("asyn inspect");
    f(PROCESS_SENDER.lock().as_ref())
}
