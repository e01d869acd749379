//! Process-wide thread package
//!
//! Free-function form of [`Runtime`]: call [`init`] once at the start of
//! `main`, spawn tasks from anywhere, then call [`run_all_threads`].
//!
//! ```rust,ignore
//! turnstile::global::init(false);
//! turnstile::global::spawn("worker", || {
//!     let roll = turnstile::protect! { shared_rng_next() };
//!     println!("{} rolled {}", turnstile::global::current_task_name(), roll);
//! });
//! turnstile::global::run_all_threads();
//! ```

use crate::error::{fatal, ThreadError};
use crate::options::RuntimeOptions;
use crate::runtime::Runtime;
use crate::sync::SemaphoreHandle;
use crate::thread::Word;
use once_cell::sync::OnceCell;
use std::io;

static GLOBAL: OnceCell<Runtime> = OnceCell::new();

/// Initialize the process-wide package; `trace` adds to `TURNSTILE_TRACE`
///
/// Must run exactly once, before any other function in this module. The
/// calling thread becomes task 1.
pub fn init(trace: bool) {
    let mut options = RuntimeOptions::from_env();
    options.trace |= trace;
    init_with(options);
}

/// Initialize the process-wide package with explicit options
pub fn init_with(options: RuntimeOptions) {
    let policy = options.fatal_policy;
    if GLOBAL.get().is_some() || GLOBAL.set(Runtime::new(options)).is_err() {
        fatal(policy, ThreadError::AlreadyInitialized);
    }
}

/// Whether [`init`] has run
pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

/// The process-wide runtime; fatal before [`init`]
pub fn runtime() -> &'static Runtime {
    match GLOBAL.get() {
        Some(runtime) => runtime,
        None => fatal(RuntimeOptions::from_env().fatal_policy, ThreadError::NotInitialized),
    }
}

/// See [`Runtime::spawn`]
pub fn spawn<F>(name: &str, body: F)
where
    F: FnOnce() + Send + 'static,
{
    runtime().spawn(name, body);
}

/// See [`Runtime::spawn_with_args`]
pub fn spawn_with_args<F>(name: &str, body: F, args: &[Word])
where
    F: FnOnce(&[Word]) + Send + 'static,
{
    runtime().spawn_with_args(name, body, args);
}

/// See [`Runtime::sleep_micros`]
pub fn sleep_micros(micros: u64) {
    runtime().sleep_micros(micros);
}

/// See [`Runtime::current_task_name`]
pub fn current_task_name() -> String {
    runtime().current_task_name()
}

/// See [`Runtime::run_all_threads`]
pub fn run_all_threads() {
    runtime().run_all_threads();
}

/// See [`Runtime::semaphore_new`]
pub fn semaphore_new(name: &str, initial: usize) -> SemaphoreHandle {
    runtime().semaphore_new(name, initial)
}

/// See [`Runtime::semaphore_signal`]
pub fn semaphore_signal(semaphore: &SemaphoreHandle) {
    runtime().semaphore_signal(semaphore);
}

/// See [`Runtime::semaphore_wait`]
pub fn semaphore_wait(semaphore: &SemaphoreHandle) {
    runtime().semaphore_wait(semaphore);
}

/// See [`Runtime::semaphore_free`]
pub fn semaphore_free(semaphore: &SemaphoreHandle) {
    runtime().semaphore_free(semaphore);
}

/// See [`Runtime::semaphore_name`]
pub fn semaphore_name(semaphore: &SemaphoreHandle) -> String {
    runtime().semaphore_name(semaphore)
}

/// See [`Runtime::with_library_lock`]
pub fn with_library_lock<R>(body: impl FnOnce() -> R) -> R {
    runtime().with_library_lock(body)
}

/// Print the task table to stdout
pub fn list_all_threads() -> io::Result<()> {
    runtime().list_tasks(&mut io::stdout().lock())
}

/// Print the semaphore table to stdout
pub fn list_all_semaphores() -> io::Result<()> {
    runtime().list_semaphores(&mut io::stdout().lock())
}

/// Run the enclosed statements under the process-wide library lock
///
/// Evaluates to the value of the block. The lock is released however the
/// block exits.
///
/// ```rust,ignore
/// let n = protect! { rng.gen_range(0..10) };
/// ```
#[macro_export]
macro_rules! protect {
    ($($body:tt)*) => {
        $crate::global::with_library_lock(|| { $($body)* })
    };
}
