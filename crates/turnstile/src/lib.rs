//! Turnstile thread package
//!
//! Spawn, gate and join-all coordination for OS threads:
//! - **Spawning**: tasks are real threads, created at once and parked at a
//!   start gate (`thread` module, [`Runtime::spawn`])
//! - **Start gate**: one broadcast releases every parked task
//! - **Completion barrier**: [`Runtime::run_all_threads`] returns only once
//!   every task, including tasks spawned by tasks, has finished
//! - **Registries**: every live task and named semaphore is tracked for
//!   lookup and debug listings (`registry`, `sync` modules)
//! - **Library lock**: scoped mutual exclusion for non-thread-safe shared
//!   facilities ([`protect!`])
//!
//! # Example
//!
//! ```rust,ignore
//! use turnstile::{Runtime, RuntimeOptions};
//!
//! let rt = Runtime::new(RuntimeOptions::default());
//! let lock = rt.semaphore_new("counter lock", 1);
//! for name in ["A", "B", "C"] {
//!     let (rt2, lock) = (rt.clone(), lock.clone());
//!     rt.spawn(name, move || {
//!         rt2.semaphore_wait(&lock);
//!         println!("{} has the lock", rt2.current_task_name());
//!         rt2.semaphore_signal(&lock);
//!     });
//! }
//! rt.run_all_threads();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Emit a `tracing::debug!` event only when lifecycle tracing is on
macro_rules! trace_event {
    ($enabled:expr, $($arg:tt)*) => {
        if $enabled {
            tracing::debug!($($arg)*);
        }
    };
}

pub mod error;
pub mod global;
pub mod options;
pub mod registry;
pub mod runtime;
pub mod sync;
pub mod thread;

/// Name reported for threads and semaphores missing from their registry
pub const UNKNOWN_NAME: &str = "** unknown **";

pub use error::{FatalPolicy, ThreadError};
pub use options::RuntimeOptions;
pub use registry::OrderedRegistry;
pub use runtime::{Runtime, DONE_SEMAPHORE_NAME};
pub use sync::{LibraryLock, Semaphore, SemaphoreHandle, SemaphoreRegistry};
pub use thread::{TaskState, ThreadRegistry, Word, MAX_TASK_ARGS};
