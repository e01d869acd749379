//! Runtime configuration

use crate::error::FatalPolicy;

/// Environment variable that turns lifecycle tracing on (`1` / `true`)
pub const TRACE_ENV: &str = "TURNSTILE_TRACE";

/// Environment variable selecting the fatal policy (`abort` / `panic`)
pub const FATAL_ENV: &str = "TURNSTILE_FATAL";

/// Options for creating a [`Runtime`](crate::Runtime)
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Emit debug events for spawn, gate, semaphore and exit activity.
    /// The output can be prodigious.
    pub trace: bool,

    /// How contract violations terminate
    pub fatal_policy: FatalPolicy,

    /// Growth chunk for the task and semaphore registries
    pub registry_chunk: usize,

    /// Name recorded for the initiating thread (task id 1)
    pub main_task_name: String,

    /// Stack size for spawned threads (None = platform default)
    pub thread_stack_size: Option<usize>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            trace: false,
            fatal_policy: FatalPolicy::Abort,
            registry_chunk: 5,
            main_task_name: "main()".to_string(),
            thread_stack_size: None,
        }
    }
}

impl RuntimeOptions {
    /// Default options with tracing set as given
    pub fn with_trace(trace: bool) -> Self {
        Self {
            trace,
            ..Self::default()
        }
    }

    /// Default options overlaid with `TURNSTILE_TRACE` and `TURNSTILE_FATAL`
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(TRACE_ENV) {
            self.trace = matches!(value.trim(), "1" | "true" | "TRUE" | "yes");
        }
        if let Some(policy) = lookup(FATAL_ENV).as_deref().and_then(FatalPolicy::parse) {
            self.fatal_policy = policy;
        }
        self
    }
}
