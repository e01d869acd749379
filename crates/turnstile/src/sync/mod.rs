//! Synchronization primitives for task coordination
//!
//! Counting semaphores and their named registry, the start gate that parks
//! freshly spawned tasks, the completion barrier behind "wait for all", and
//! the library lock for non-thread-safe shared facilities. Each facility is
//! guarded by its own lock.

mod barrier;
mod gate;
mod library_lock;
mod registry;
mod semaphore;

pub use barrier::CompletionBarrier;
pub use gate::StartGate;
pub use library_lock::{LibraryLock, LibraryLockGuard};
pub use registry::{SemaphoreRecord, SemaphoreRegistry, SEMAPHORE_SEPARATOR};
pub use semaphore::{Semaphore, SemaphoreHandle, SemaphoreId};
