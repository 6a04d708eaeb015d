// Doorbell for a dispatcher thread: sleep until the word moves away from `seen`.

use std::sync::atomic::AtomicU32;
use std::time::Duration;

#[cfg(target_os = "linux")]
pub fn doorbell_wait(word: &AtomicU32, seen: u32, timeout: Option<Duration>) {
    use std::ptr;
    use std::sync::atomic::Ordering;

    if word.load(Ordering::Acquire) != seen {
        return;
    }

    let ts = timeout.map(|t| {
        // Some targets pad timespec with private fields.
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        ts.tv_sec = t.as_secs() as libc::time_t;
        ts.tv_nsec = t.subsec_nanos() as _;
        ts
    });
    let ts_ptr = ts
        .as_ref()
        .map_or(ptr::null(), |ts| ts as *const libc::timespec);

    // EAGAIN, EINTR and ETIMEDOUT all just mean "look again".
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word as *const AtomicU32 as *const u32,
            libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
            seen,
            ts_ptr,
            ptr::null::<u32>(),
            0u32,
        );
    }
}

#[cfg(target_os = "linux")]
pub fn doorbell_ring(word: &AtomicU32) {
    use std::sync::atomic::Ordering;

    word.fetch_add(1, Ordering::Release);
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word as *const AtomicU32 as *const u32,
            libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
            i32::MAX, // every waiter
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        );
    }
}

#[cfg(not(target_os = "linux"))]
pub fn doorbell_wait(word: &AtomicU32, seen: u32, _timeout: Option<Duration>) {
    use std::sync::atomic::Ordering;

    if word.load(Ordering::Acquire) == seen {
        std::thread::yield_now();
    }
}

#[cfg(not(target_os = "linux"))]
pub fn doorbell_ring(word: &AtomicU32) {
    word.fetch_add(1, std::sync::atomic::Ordering::Release);
}
