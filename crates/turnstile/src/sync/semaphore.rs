//! Counting semaphore for OS threads

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Unique identifier for a Semaphore
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SemaphoreId(u64);

static NEXT_SEMAPHORE_ID: AtomicU64 = AtomicU64::new(1);

impl SemaphoreId {
    /// Generate a new unique SemaphoreId
    pub fn new() -> Self {
        SemaphoreId(NEXT_SEMAPHORE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for SemaphoreId {
    fn default() -> Self {
        Self::new()
    }
}

/// Counting semaphore
///
/// `wait` blocks the calling thread until the count is positive and then
/// decrements it. `signal` increments the count and wakes one waiter. There
/// is no upper bound on the count.
pub struct Semaphore {
    /// Unique semaphore ID
    id: SemaphoreId,

    /// Current count
    count: Mutex<usize>,

    /// Signalled whenever the count is incremented
    available: Condvar,

    /// Threads currently blocked in `wait`
    waiters: AtomicUsize,
}

impl Semaphore {
    /// Create a semaphore seeded with `initial`
    pub fn new(initial: usize) -> Self {
        Self {
            id: SemaphoreId::new(),
            count: Mutex::new(initial),
            available: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Get the semaphore ID
    pub fn id(&self) -> SemaphoreId {
        self.id
    }

    /// Increment the count, waking one waiter if any
    pub fn signal(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.available.notify_one();
    }

    /// Block until the count is positive, then decrement it
    pub fn wait(&self) {
        let mut count = self.count.lock();
        if *count == 0 {
            self.waiters.fetch_add(1, Ordering::AcqRel);
            while *count == 0 {
                self.available.wait(&mut count);
            }
            self.waiters.fetch_sub(1, Ordering::AcqRel);
        }
        *count -= 1;
    }

    /// Decrement the count if it is positive, without blocking
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Current count (a snapshot, for listings)
    pub fn value(&self) -> usize {
        *self.count.lock()
    }

    /// Number of threads blocked in `wait` (a snapshot, for listings)
    pub fn waiting_count(&self) -> usize {
        self.waiters.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("id", &self.id)
            .field("value", &self.value())
            .field("waiters", &self.waiting_count())
            .finish()
    }
}

/// Shared handle to a [`Semaphore`]
///
/// Handles compare equal only when they refer to the same semaphore.
#[derive(Clone)]
pub struct SemaphoreHandle(Arc<Semaphore>);

impl SemaphoreHandle {
    /// Allocate a fresh semaphore seeded with `initial`
    pub fn new(initial: usize) -> Self {
        SemaphoreHandle(Arc::new(Semaphore::new(initial)))
    }

    /// Get the semaphore ID
    pub fn id(&self) -> SemaphoreId {
        self.0.id()
    }
}

impl std::ops::Deref for SemaphoreHandle {
    type Target = Semaphore;

    fn deref(&self) -> &Semaphore {
        &self.0
    }
}

impl PartialEq for SemaphoreHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SemaphoreHandle {}

impl fmt::Debug for SemaphoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
