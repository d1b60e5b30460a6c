use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a record's write flag for the duration of one save.
///
/// Acquisition never waits: a flag that is already set means another save on
/// the same instance is still in flight. The flag is cleared on drop, so every
/// exit path of a save, early returns and cancelled futures included, releases it.
pub(crate) struct WriteGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> WriteGuard<'a> {
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
