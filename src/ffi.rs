// C entry points over the process-wide async table.

use libc::{c_int, c_uint};

use crate::ASYN::process;
use crate::ASYN::Structs::Message_Structs::{Endpoint, ErrorCode, Message};
use crate::ASYN::Table::layout::AsynFlags;

/// Queue `*msg` for `dst` with `flags` (`AMF_NOTIFY`, `AMF_NOREPLY`, `AMF_NOTIFY_ERR`).
///
/// # Returns
/// * `0` if the kernel accepted the table
/// * the kernel's status if it refused it
/// * `EFAULT` for a null message, `EINVAL` for bad flags, `ENOSYS` with no transport
///
/// # Safety
/// `msg` must be null or point to a readable `Message`.
#[no_mangle]
pub unsafe extern "C" fn asyn_send3(dst: c_int, msg: *const Message, flags: c_uint) -> c_int {
    if msg.is_null() {
        return ErrorCode::EFAULT.as_raw();
    }
    let flags = AsynFlags::from_bits_retain(flags);
    match process::asynsend3(Endpoint(dst), &*msg, flags) {
        Ok(()) => ErrorCode::OK.as_raw(),
        Err(e) => e.code().as_raw(),
    }
}

/// `asyn_send3(dst, msg, 0)`.
///
/// # Safety
/// See [`asyn_send3`].
#[no_mangle]
pub unsafe extern "C" fn asyn_send(dst: c_int, msg: *const Message) -> c_int {
    asyn_send3(dst, msg, 0)
}

/// Fetch one undelivered `AMF_NOTIFY_ERR` message.
///
/// # Returns
/// * `1` and fills all three outputs when a failure was pending
/// * `0` when there was none
/// * `EFAULT` if any output pointer is null
///
/// # Safety
/// Each pointer must be null or point to writable storage of its type.
#[no_mangle]
pub unsafe extern "C" fn asyn_geterror(dst: *mut Endpoint, msg: *mut Message, err: *mut c_int) -> c_int {
    if dst.is_null() || msg.is_null() || err.is_null() {
        return ErrorCode::EFAULT.as_raw();
    }
    match process::asyn_geterror() {
        Some(record) => {
            *dst = record.dst;
            *msg = record.msg;
            *err = record.result.as_raw();
            1
        }
        None => 0,
    }
}
