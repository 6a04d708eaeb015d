use std::cell::Cell;

thread_local! {
    static INSIDE: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside the async table.
///
/// Anything reached from a send (a logger, a panic hook) that tries to send again
/// would otherwise deadlock on the process table or corrupt it; it panics instead.
pub(crate) struct ReentryGuard {
    _private: (),
}

impl ReentryGuard {
    pub(crate) fn enter(op: &'static str) -> Self {
        if INSIDE.with(|inside| inside.replace(true)) {
            panic!("{op}: re-entered while the async table is in use");
        }
        ReentryGuard { _private: () }
    }

    pub(crate) fn is_held() -> bool {
        INSIDE.with(|inside| inside.get())
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        INSIDE.with(|inside| inside.set(false));
    }
}
