//! Package lifecycle: spawn, gate, join-all

use crate::error::{fatal, ThreadError};
use crate::options::RuntimeOptions;
use crate::sync::{
    CompletionBarrier, LibraryLock, LibraryLockGuard, SemaphoreHandle, SemaphoreRegistry,
    StartGate,
};
use crate::thread::{TaskArgs, TaskBody, TaskState, ThreadRegistry, Word};
use crossbeam::atomic::AtomicCell;
use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Name (before prefixing) of the semaphore behind the completion barrier
pub const DONE_SEMAPHORE_NAME: &str = "ThreadsAllCompleted";

struct Shared {
    options: RuntimeOptions,
    threads: ThreadRegistry,
    semaphores: SemaphoreRegistry,
    gate: StartGate,
    barrier: CompletionBarrier,
    library_lock: LibraryLock,
}

/// A thread package instance
///
/// Owns the task registry, the semaphore registry, the start gate, the
/// completion barrier and the library lock. Cloning is cheap and every clone
/// refers to the same instance; spawned tasks receive one so they can spawn
/// further tasks.
///
/// The thread that calls [`Runtime::new`] becomes task 1 and is expected to
/// be the one that calls [`Runtime::run_all_threads`].
///
/// ```rust,ignore
/// let rt = Runtime::new(RuntimeOptions::default());
/// for name in ["A", "B", "C"] {
///     let counter = counter.clone();
///     rt.spawn(name, move || { counter.fetch_add(1, Ordering::SeqCst); });
/// }
/// rt.run_all_threads();
/// ```
#[derive(Clone)]
pub struct Runtime {
    shared: Arc<Shared>,
}

impl Runtime {
    /// Set up a package instance, registering the calling thread as task 1
    pub fn new(options: RuntimeOptions) -> Self {
        trace_event!(options.trace, chunk = options.registry_chunk, "initializing thread package");

        let threads = ThreadRegistry::new(options.registry_chunk, options.trace);
        threads.register_current(&options.main_task_name);

        let semaphores = SemaphoreRegistry::new(options.registry_chunk, options.trace);
        let done = match semaphores.create(DONE_SEMAPHORE_NAME, 0) {
            Ok(done) => done,
            Err(err) => fatal(options.fatal_policy, err),
        };

        Self {
            shared: Arc::new(Shared {
                threads,
                semaphores,
                gate: StartGate::new(),
                barrier: CompletionBarrier::new(done),
                library_lock: LibraryLock::new(),
                options,
            }),
        }
    }

    /// Options this instance was created with
    pub fn options(&self) -> &RuntimeOptions {
        &self.shared.options
    }

    fn trace(&self) -> bool {
        self.shared.options.trace
    }

    fn check<T>(&self, result: Result<T, ThreadError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => fatal(self.shared.options.fatal_policy, err),
        }
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    /// Spawn a task running `body`
    ///
    /// The thread is created immediately and parks at the start gate. Never
    /// blocks the caller.
    pub fn spawn<F>(&self, name: &str, body: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let result = self.try_spawn_body(name, TaskBody::Thunk(Box::new(body)));
        self.check(result)
    }

    /// Spawn a task that calls `body` with a copy of `args`
    ///
    /// More than [`MAX_TASK_ARGS`](crate::MAX_TASK_ARGS) arguments is fatal,
    /// here, before any thread is created.
    pub fn spawn_with_args<F>(&self, name: &str, body: F, args: &[Word])
    where
        F: FnOnce(&[Word]) + Send + 'static,
    {
        let result = self.try_spawn_with_args(name, body, args);
        self.check(result)
    }

    /// [`spawn_with_args`](Self::spawn_with_args) returning the error instead
    /// of terminating
    pub fn try_spawn_with_args<F>(&self, name: &str, body: F, args: &[Word]) -> Result<(), ThreadError>
    where
        F: FnOnce(&[Word]) + Send + 'static,
    {
        let args = TaskArgs::new(name, args)?;
        self.try_spawn_body(
            name,
            TaskBody::Words {
                func: Box::new(body),
                args,
            },
        )
    }

    fn try_spawn_body(&self, name: &str, body: TaskBody) -> Result<(), ThreadError> {
        trace_event!(self.trace(), task = %name, args = body.arity(), "spawning task");

        // Counted before the thread exists, so a parent finishing right after
        // spawning can never take the live count to zero ahead of its child.
        self.shared.barrier.enter();

        let state = Arc::new(AtomicCell::new(TaskState::Created));
        let registered = self.shared.threads.register_with(name, state.clone(), || {
            let mut builder = thread::Builder::new().name(name.to_string());
            if let Some(size) = self.shared.options.thread_stack_size {
                builder = builder.stack_size(size);
            }

            let runtime = self.clone();
            let task_name = name.to_string();
            builder
                .spawn(move || runtime.run_task(task_name, state, body))
                .map(|handle| handle.thread().id())
                .map_err(|err| ThreadError::Spawn {
                    name: name.to_string(),
                    reason: err.to_string(),
                })
        });

        match registered {
            Ok(id) => {
                trace_event!(self.trace(), task = %name, id, "task registered");
                Ok(())
            }
            Err(err) => {
                self.shared.barrier.leave();
                Err(err)
            }
        }
    }

    /// Body of every spawned thread
    fn run_task(&self, name: String, state: Arc<AtomicCell<TaskState>>, body: TaskBody) {
        state.store(TaskState::Parked);
        trace_event!(self.trace(), task = %name, "waiting at start gate");
        self.shared.gate.wait();

        state.store(TaskState::Running);
        trace_event!(self.trace(), task = %name, args = body.arity(), "running task");
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| body.run())) {
            tracing::error!(task = %name, panic = %panic_message(payload.as_ref()), "task panicked");
        }

        let last = self.shared.barrier.leave();
        trace_event!(self.trace(), task = %name, last, "task finished");

        let result = self.shared.threads.deregister(thread::current().id());
        self.check(result)
    }

    // ------------------------------------------------------------------------
    // Gate and barrier
    // ------------------------------------------------------------------------

    /// Open the start gate, letting every parked task run
    ///
    /// Opening an already open gate does nothing.
    pub fn release_all(&self) {
        if self.shared.gate.open() {
            trace_event!(self.trace(), live = self.shared.barrier.live(), "releasing all tasks");
            self.trace_tables();
        } else {
            trace_event!(self.trace(), "start gate already open");
        }
    }

    /// Whether the start gate has been opened
    pub fn is_released(&self) -> bool {
        self.shared.gate.is_open()
    }

    /// Open the gate if needed and block until every task has finished
    ///
    /// Tasks spawned by other tasks, before or after this call, are waited
    /// for as well. On return every finished task has left the registry and
    /// the barrier semaphore has been freed. The barrier is single-use: a
    /// second call is fatal.
    pub fn wait_for_all(&self) {
        self.release_all();

        let waited = self.shared.barrier.wait();
        let done = self.check(waited);

        // The live count drops before deregistration; let the stragglers finish
        self.shared.threads.wait_until_at_most(1);
        self.shared.semaphores.free(&done);

        trace_event!(self.trace(), "all tasks completed");
        self.trace_tables();
    }

    /// Release every parked task and wait for all of them to finish
    pub fn run_all_threads(&self) {
        trace_event!(self.trace(), tasks = self.task_count(), "running all threads");
        self.wait_for_all();
    }

    /// Tasks spawned and not yet finished
    pub fn live_tasks(&self) -> usize {
        self.shared.barrier.live()
    }

    // ------------------------------------------------------------------------
    // Task queries
    // ------------------------------------------------------------------------

    /// Name of the calling task, or `"** unknown **"` for foreign threads
    pub fn current_task_name(&self) -> String {
        self.shared.threads.current_name()
    }

    /// Records in the task registry, task 1 included
    pub fn task_count(&self) -> usize {
        self.shared.threads.len()
    }

    /// Suspend the calling task for `duration`
    pub fn sleep(&self, duration: Duration) {
        if self.trace() {
            tracing::debug!(
                task = %self.current_task_name(),
                seconds = duration.as_secs_f64(),
                "sleeping"
            );
        }
        thread::sleep(duration);
    }

    /// Suspend the calling task for `micros` microseconds
    pub fn sleep_micros(&self, micros: u64) {
        self.sleep(Duration::from_micros(micros));
    }

    // ------------------------------------------------------------------------
    // Semaphores
    // ------------------------------------------------------------------------

    /// Create a named semaphore; an invalid or duplicate name is fatal
    pub fn semaphore_new(&self, name: &str, initial: usize) -> SemaphoreHandle {
        let result = self.shared.semaphores.create(name, initial);
        self.check(result)
    }

    /// Create a named semaphore, returning the error instead of terminating
    pub fn try_semaphore_new(&self, name: &str, initial: usize) -> Result<SemaphoreHandle, ThreadError> {
        self.shared.semaphores.create(name, initial)
    }

    /// Increment a semaphore
    pub fn semaphore_signal(&self, semaphore: &SemaphoreHandle) {
        self.shared.semaphores.signal(semaphore);
    }

    /// Wait on a semaphore
    pub fn semaphore_wait(&self, semaphore: &SemaphoreHandle) {
        self.shared.semaphores.wait(semaphore);
    }

    /// Unregister a semaphore; nobody may still be using it
    pub fn semaphore_free(&self, semaphore: &SemaphoreHandle) {
        self.shared.semaphores.free(semaphore);
    }

    /// Registered name of a semaphore, or `"** unknown **"`
    pub fn semaphore_name(&self, semaphore: &SemaphoreHandle) -> String {
        self.shared.semaphores.name_of(semaphore)
    }

    /// Registered semaphores, the barrier's own included until it is consumed
    pub fn semaphore_count(&self) -> usize {
        self.shared.semaphores.len()
    }

    // ------------------------------------------------------------------------
    // Library lock
    // ------------------------------------------------------------------------

    /// Run `body` under the library lock
    pub fn with_library_lock<R>(&self, body: impl FnOnce() -> R) -> R {
        trace_event!(self.trace(), "acquiring library lock");
        self.shared.library_lock.with(body)
    }

    /// Hold the library lock until the guard drops
    pub fn library_lock(&self) -> LibraryLockGuard<'_> {
        trace_event!(self.trace(), "acquiring library lock");
        self.shared.library_lock.acquire()
    }

    // ------------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------------

    /// Write the task table
    pub fn list_tasks(&self, out: &mut dyn Write) -> io::Result<()> {
        self.shared.threads.list(out)
    }

    /// Write the semaphore table
    pub fn list_semaphores(&self, out: &mut dyn Write) -> io::Result<()> {
        self.shared.semaphores.list(out)
    }

    fn trace_tables(&self) {
        if !self.trace() {
            return;
        }
        let mut out = Vec::new();
        if self.list_tasks(&mut out).and_then(|_| self.list_semaphores(&mut out)).is_ok() {
            tracing::debug!("\n{}", String::from_utf8_lossy(&out));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
