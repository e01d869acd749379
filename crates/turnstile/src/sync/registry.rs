//! Registry of named semaphores

use crate::error::ThreadError;
use crate::registry::OrderedRegistry;
use crate::sync::SemaphoreHandle;
use crate::UNKNOWN_NAME;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::io::{self, Write};

/// Prefix of every registered semaphore name; forbidden inside caller names
pub const SEMAPHORE_SEPARATOR: char = '/';

/// One registered semaphore
#[derive(Debug, Clone)]
pub struct SemaphoreRecord {
    /// Display number (registry length + 1 at creation)
    pub id: usize,
    /// Registered name, separator included
    pub name: String,
    /// The semaphore itself
    pub handle: SemaphoreHandle,
}

fn by_handle(key: &SemaphoreHandle, record: &SemaphoreRecord) -> Ordering {
    if *key == record.handle {
        Ordering::Equal
    } else {
        Ordering::Less
    }
}

fn by_name(key: &str, record: &SemaphoreRecord) -> Ordering {
    key.cmp(record.name.as_str())
}

/// Registry of all live named semaphores
///
/// The registry is the only namespace a semaphore lives in: a name exists
/// exactly as long as its record is here. Every mutation and listing takes
/// the registry lock.
pub struct SemaphoreRegistry {
    records: Mutex<OrderedRegistry<SemaphoreRecord>>,
    trace: bool,
}

impl SemaphoreRegistry {
    /// Create an empty registry
    pub fn new(chunk: usize, trace: bool) -> Self {
        let records = OrderedRegistry::with_cleanup(chunk, move |record: &mut SemaphoreRecord| {
            trace_event!(trace, semaphore = %record.name, "semaphore record released");
        });
        Self {
            records: Mutex::new(records),
            trace,
        }
    }

    /// Registered form of a caller-supplied name
    pub fn qualified_name(name: &str) -> String {
        format!("{}{}", SEMAPHORE_SEPARATOR, name)
    }

    /// Create and register a semaphore seeded with `initial`
    ///
    /// Fails if `name` contains the separator or if its registered form is
    /// already taken. The existing semaphore is untouched by a failed create.
    pub fn create(&self, name: &str, initial: usize) -> Result<SemaphoreHandle, ThreadError> {
        if name.contains(SEMAPHORE_SEPARATOR) {
            return Err(ThreadError::InvalidSemaphoreName(name.to_string()));
        }
        let qualified = Self::qualified_name(name);

        let mut records = self.records.lock();
        if records.search(qualified.as_str(), by_name, 0, false).is_some() {
            return Err(ThreadError::DuplicateSemaphore(qualified));
        }

        let handle = SemaphoreHandle::new(initial);
        let id = records.len() + 1;
        trace_event!(self.trace, semaphore = %qualified, id, initial, "creating semaphore");
        records.append(SemaphoreRecord {
            id,
            name: qualified,
            handle: handle.clone(),
        });
        Ok(handle)
    }

    /// Increment a semaphore
    pub fn signal(&self, handle: &SemaphoreHandle) {
        if self.trace {
            tracing::debug!(semaphore = %self.name_of(handle), "signal");
        }
        handle.signal();
    }

    /// Block until a semaphore is positive, then decrement it
    pub fn wait(&self, handle: &SemaphoreHandle) {
        if self.trace {
            tracing::debug!(semaphore = %self.name_of(handle), "wait");
        }
        handle.wait();
    }

    /// Remove a semaphore from the registry
    ///
    /// Returns false (and leaves the registry alone) when the handle is not
    /// registered. Nobody may be waiting on or signalling the semaphore.
    pub fn free(&self, handle: &SemaphoreHandle) -> bool {
        let mut records = self.records.lock();
        match records.search(handle, by_handle, 0, false) {
            Some(position) => {
                records.delete(position);
                true
            }
            None => {
                tracing::warn!(semaphore_id = handle.id().as_u64(), "freeing unregistered semaphore");
                false
            }
        }
    }

    /// Registered name of a semaphore, or the unknown sentinel
    pub fn name_of(&self, handle: &SemaphoreHandle) -> String {
        let records = self.records.lock();
        records
            .search(handle, by_handle, 0, false)
            .map(|position| records.nth(position).name.clone())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    /// Whether a caller-supplied name is currently registered
    pub fn contains(&self, name: &str) -> bool {
        let qualified = Self::qualified_name(name);
        self.records
            .lock()
            .search(qualified.as_str(), by_name, 0, false)
            .is_some()
    }

    /// Number of registered semaphores
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no semaphores are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the semaphore table
    ///
    /// The snapshot is consistent but may be stale as soon as it is written.
    pub fn list(&self, out: &mut dyn Write) -> io::Result<()> {
        const RULE: &str = "+------------+-----------------------------+--------+---------+";
        let records = self.records.lock();
        writeln!(out, " Semaphore Table")?;
        writeln!(out, "{}", RULE)?;
        writeln!(out, "|semaphoreID | Semaphore Name              | Value  | Waiting |")?;
        writeln!(out, "{}", RULE)?;
        for record in records.iter() {
            writeln!(
                out,
                "|   {:4}     | {:<25}   | {:6} | {:7} |",
                record.id,
                record.name,
                record.handle.value(),
                record.handle.waiting_count()
            )?;
        }
        writeln!(out, "{}", RULE)
    }
}
