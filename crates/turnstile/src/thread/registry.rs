//! Table of live tasks keyed by OS thread

use crate::error::ThreadError;
use crate::registry::OrderedRegistry;
use crate::thread::TaskState;
use crate::UNKNOWN_NAME;
use crossbeam::atomic::AtomicCell;
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// One live task
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// Display number (registry length + 1 at insertion; may be reused)
    pub id: usize,
    /// Name given at spawn
    pub name: String,
    /// OS thread running the task; the real key
    pub handle: ThreadId,
    /// Lifecycle state, shared with the running thread
    pub state: Arc<AtomicCell<TaskState>>,
}

fn by_handle(key: &ThreadId, record: &TaskRecord) -> Ordering {
    if *key == record.handle {
        Ordering::Equal
    } else {
        Ordering::Less
    }
}

/// Registry of every live task plus the initiating thread
///
/// Appends happen on spawn, deletes when a task's body returns, both under
/// the registry lock. Listings take the same lock.
pub struct ThreadRegistry {
    records: Mutex<OrderedRegistry<TaskRecord>>,
    /// Notified after every deregistration
    shrunk: Condvar,
}

impl ThreadRegistry {
    /// Create an empty registry
    pub fn new(chunk: usize, trace: bool) -> Self {
        let records = OrderedRegistry::with_cleanup(chunk, move |record: &mut TaskRecord| {
            record.state.store(TaskState::Deregistered);
            trace_event!(trace, task = %record.name, id = record.id, "task record released");
        });
        Self {
            records: Mutex::new(records),
            shrunk: Condvar::new(),
        }
    }

    /// Record the calling thread as a running task; returns its id
    pub fn register_current(&self, name: &str) -> usize {
        let state = Arc::new(AtomicCell::new(TaskState::Running));
        let mut records = self.records.lock();
        let id = records.len() + 1;
        records.append(TaskRecord {
            id,
            name: name.to_string(),
            handle: thread::current().id(),
            state,
        });
        id
    }

    /// Create a thread with `create` and record it, as one critical section
    ///
    /// The new thread cannot look itself up or deregister before its record
    /// exists, whether or not the start gate is already open.
    pub fn register_with<E>(
        &self,
        name: &str,
        state: Arc<AtomicCell<TaskState>>,
        create: impl FnOnce() -> Result<ThreadId, E>,
    ) -> Result<usize, E> {
        let mut records = self.records.lock();
        let handle = create()?;
        let id = records.len() + 1;
        records.append(TaskRecord {
            id,
            name: name.to_string(),
            handle,
            state,
        });
        Ok(id)
    }

    /// Remove the record for `handle`
    ///
    /// A miss means a running task lost its own record.
    pub fn deregister(&self, handle: ThreadId) -> Result<(), ThreadError> {
        let mut records = self.records.lock();
        let position = records
            .search(&handle, by_handle, 0, false)
            .ok_or_else(|| ThreadError::MissingTaskRecord(format!("{:?}", handle)))?;
        records.delete(position);
        self.shrunk.notify_all();
        Ok(())
    }

    /// Name recorded for `handle`
    pub fn name_of(&self, handle: ThreadId) -> Option<String> {
        let records = self.records.lock();
        records
            .search(&handle, by_handle, 0, false)
            .map(|position| records.nth(position).name.clone())
    }

    /// Name of the calling thread's task, or the unknown sentinel
    pub fn current_name(&self) -> String {
        self.name_of(thread::current().id())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    /// Lifecycle state recorded for `handle`
    pub fn state_of(&self, handle: ThreadId) -> Option<TaskState> {
        let records = self.records.lock();
        records
            .search(&handle, by_handle, 0, false)
            .map(|position| records.nth(position).state.load())
    }

    /// Number of records (the initiating thread included)
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the registry holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until at most `remaining` records are left
    pub fn wait_until_at_most(&self, remaining: usize) {
        let mut records = self.records.lock();
        while records.len() > remaining {
            self.shrunk.wait(&mut records);
        }
    }

    /// Write the task table
    ///
    /// The snapshot is consistent but may be stale as soon as it is written.
    pub fn list(&self, out: &mut dyn Write) -> io::Result<()> {
        const RULE: &str = "+------------+-----------------------------+------------------+---------+";
        let records = self.records.lock();
        writeln!(out, " Thread Table")?;
        writeln!(out, "{}", RULE)?;
        writeln!(out, "| Thread ID  | Thread Name                 | OS thread        | State   |")?;
        writeln!(out, "{}", RULE)?;
        for record in records.iter() {
            writeln!(
                out,
                "|   {:4}     | {:<25}   | {:<16} | {:<7} |",
                record.id,
                record.name,
                format!("{:?}", record.handle),
                record.state.load()
            )?;
        }
        writeln!(out, "{}", RULE)
    }
}
