//! Error type and fatal-error policy

use crate::thread::MAX_TASK_ARGS;

/// Errors raised by the thread package
///
/// Every variant is a contract violation or a resource failure. None of them
/// is recoverable at the runtime level: the [`Runtime`](crate::Runtime)
/// reports them through [`fatal`], which terminates according to the
/// configured [`FatalPolicy`]. Lower-level components return them as plain
/// `Result`s so they can be inspected directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThreadError {
    /// Word-argument task given more arguments than the dispatch supports
    #[error("task `{name}` was given {given} arguments, at most {} are supported", MAX_TASK_ARGS)]
    TooManyArguments {
        /// Task name passed to spawn
        name: String,
        /// Number of arguments supplied
        given: usize,
    },

    /// Semaphore name contains the reserved separator
    #[error("semaphore name `{0}` must not contain '/'")]
    InvalidSemaphoreName(String),

    /// A semaphore with the same computed name is already registered
    #[error("semaphore {0} already exists")]
    DuplicateSemaphore(String),

    /// A running task could not find its own registry record
    #[error("task on thread {0} has no registry record")]
    MissingTaskRecord(String),

    /// The OS refused to create a thread
    #[error("failed to create thread for task `{name}`: {reason}")]
    Spawn {
        /// Task name passed to spawn
        name: String,
        /// OS error message
        reason: String,
    },

    /// `wait_for_all` was called after the barrier had already been consumed
    #[error("completion barrier already consumed by an earlier wait")]
    BarrierConsumed,

    /// The process-wide runtime was initialized twice
    #[error("thread package already initialized")]
    AlreadyInitialized,

    /// A process-wide call was made before `init`
    #[error("thread package used before init")]
    NotInitialized,
}

/// What happens when the runtime hits a [`ThreadError`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FatalPolicy {
    /// Print the diagnostic and abort the process
    #[default]
    Abort,
    /// Panic with the diagnostic (unwinds the calling thread)
    Panic,
}

impl FatalPolicy {
    /// Parse `abort` / `panic` (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(FatalPolicy::Abort),
            "panic" => Some(FatalPolicy::Panic),
            _ => None,
        }
    }
}

/// Report a contract violation and terminate
pub(crate) fn fatal(policy: FatalPolicy, err: ThreadError) -> ! {
    tracing::error!(error = %err, "thread package contract violation");
    match policy {
        FatalPolicy::Abort => {
            eprintln!("turnstile: fatal: {}", err);
            std::process::abort()
        }
        FatalPolicy::Panic => panic!("turnstile: fatal: {}", err),
    }
}
