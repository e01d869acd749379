//! Scoped lock for non-thread-safe shared facilities

use parking_lot::{Mutex, MutexGuard};

/// Guard returned by [`LibraryLock::acquire`]; the lock is released on drop
pub type LibraryLockGuard<'a> = MutexGuard<'a, ()>;

/// Single mutual-exclusion lock wrapped around calls into shared facilities
/// that are not safe to call concurrently (a shared PRNG, for example)
///
/// The lock is not reentrant. Waiting on the start gate or on a semaphore
/// while holding it deadlocks any task that needs it to make progress.
#[derive(Debug, Default)]
pub struct LibraryLock {
    lock: Mutex<()>,
}

impl LibraryLock {
    /// Create an unlocked library lock
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock until the guard is dropped
    pub fn acquire(&self) -> LibraryLockGuard<'_> {
        self.lock.lock()
    }

    /// Run `body` while holding the lock
    ///
    /// The lock is released on every exit path, unwinding included.
    pub fn with<R>(&self, body: impl FnOnce() -> R) -> R {
        let _guard = self.lock.lock();
        body()
    }

    /// Whether some thread currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_with_returns_body_value() {
        let lock = LibraryLock::new();
        let value = lock.with(|| 41 + 1);
        assert_eq!(value, 42);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = LibraryLock::new();
        {
            let _guard = lock.acquire();
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_released_when_body_panics() {
        let lock = LibraryLock::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            lock.with(|| panic!("boom"));
        }));
        assert!(result.is_err());
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_serializes_read_modify_write() {
        let lock = Arc::new(LibraryLock::new());
        // Deliberately non-atomic shared state, only touched under the lock
        let shared = Arc::new(parking_lot::Mutex::new(0u64));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        lock.with(|| {
                            let current = *shared.lock();
                            *shared.lock() = current + 1;
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*shared.lock(), 8000);
    }
}
