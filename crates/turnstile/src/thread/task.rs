//! Task bodies, bounded word arguments and lifecycle state

use crate::error::ThreadError;
use std::fmt;

/// Integer- or pointer-sized argument passed to a word-argument task
pub type Word = usize;

/// Most arguments a word-argument task accepts
pub const MAX_TASK_ARGS: usize = 8;

/// Lifecycle state of a spawned task
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Thread created, not yet at the start gate
    Created,
    /// Blocked at the start gate
    Parked,
    /// Executing its body
    Running,
    /// Record removed from the registry
    Deregistered,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Created => "created",
            TaskState::Parked => "parked",
            TaskState::Running => "running",
            TaskState::Deregistered => "gone",
        };
        f.pad(label)
    }
}

/// Argument words copied into a task at spawn time
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TaskArgs {
    words: [Word; MAX_TASK_ARGS],
    len: usize,
}

impl TaskArgs {
    /// Copy `args`, rejecting more than [`MAX_TASK_ARGS`]
    pub fn new(task_name: &str, args: &[Word]) -> Result<Self, ThreadError> {
        if args.len() > MAX_TASK_ARGS {
            return Err(ThreadError::TooManyArguments {
                name: task_name.to_string(),
                given: args.len(),
            });
        }
        let mut words = [0; MAX_TASK_ARGS];
        words[..args.len()].copy_from_slice(args);
        Ok(Self {
            words,
            len: args.len(),
        })
    }

    /// The recorded arguments, in order
    pub fn as_slice(&self) -> &[Word] {
        &self.words[..self.len]
    }

    /// Number of recorded arguments
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no arguments were recorded
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Work a spawned task performs once it passes the gate
pub(crate) enum TaskBody {
    /// Closure with its arguments already captured
    Thunk(Box<dyn FnOnce() + Send>),
    /// Function called with exactly the recorded argument words
    Words {
        func: Box<dyn FnOnce(&[Word]) + Send>,
        args: TaskArgs,
    },
}

impl TaskBody {
    /// Number of positional arguments the body is dispatched with
    pub(crate) fn arity(&self) -> usize {
        match self {
            TaskBody::Thunk(_) => 0,
            TaskBody::Words { args, .. } => args.len(),
        }
    }

    pub(crate) fn run(self) {
        match self {
            TaskBody::Thunk(func) => func(),
            TaskBody::Words { func, args } => func(args.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_args_copied_in_order() {
        let args = TaskArgs::new("t", &[3, 1, 4]).unwrap();
        assert_eq!(args.as_slice(), &[3, 1, 4]);
        assert_eq!(args.len(), 3);
        assert!(!args.is_empty());

        let none = TaskArgs::new("t", &[]).unwrap();
        assert!(none.is_empty());
        assert_eq!(none.as_slice(), &[] as &[Word]);
    }

    #[test]
    fn test_args_at_limit() {
        let words: Vec<Word> = (1..=MAX_TASK_ARGS).collect();
        let args = TaskArgs::new("eight", &words).unwrap();
        assert_eq!(args.as_slice(), words.as_slice());
    }

    #[test]
    fn test_args_over_limit() {
        let words: Vec<Word> = (0..9).collect();
        let err = TaskArgs::new("nine", &words).unwrap_err();
        assert_eq!(
            err,
            ThreadError::TooManyArguments {
                name: "nine".to_string(),
                given: 9,
            }
        );
    }

    #[test]
    fn test_body_dispatches_recorded_args() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let body = TaskBody::Words {
            func: Box::new(move |args: &[Word]| sink.lock().unwrap().extend_from_slice(args)),
            args: TaskArgs::new("t", &[7, 8]).unwrap(),
        };
        assert_eq!(body.arity(), 2);
        body.run();
        assert_eq!(*seen.lock().unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_thunk_body() {
        let hit = Arc::new(Mutex::new(false));
        let flag = hit.clone();
        let body = TaskBody::Thunk(Box::new(move || *flag.lock().unwrap() = true));
        assert_eq!(body.arity(), 0);
        body.run();
        assert!(*hit.lock().unwrap());
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(TaskState::Parked.to_string(), "parked");
        assert_eq!(TaskState::Deregistered.to_string(), "gone");
    }
}
