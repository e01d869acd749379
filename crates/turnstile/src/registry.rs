//! Insertion-ordered record store
//!
//! [`OrderedRegistry`] backs both the task table and the semaphore table. It
//! keeps records in insertion order, hands out positional access, and finds
//! records with a caller-supplied comparator. A per-record cleanup hook runs
//! whenever a record leaves the registry by deletion or disposal.
//!
//! Positional access out of range is a caller bug and panics.

use std::cmp::Ordering;
use std::fmt;

/// Allocation chunk used when a registry is created with a chunk of 0
pub const DEFAULT_CHUNK: usize = 10;

/// Cleanup hook run on each record as it is deleted or disposed
pub type CleanupFn<T> = Box<dyn FnMut(&mut T) + Send>;

/// Insertion-ordered registry of records
pub struct OrderedRegistry<T> {
    /// Records in insertion order
    items: Vec<T>,

    /// Minimum number of slots added when the registry is full
    chunk: usize,

    /// Hook run on records leaving through `delete` or drop
    cleanup: Option<CleanupFn<T>>,
}

impl<T> OrderedRegistry<T> {
    /// Create an empty registry without a cleanup hook
    pub fn new(chunk: usize) -> Self {
        let chunk = if chunk == 0 { DEFAULT_CHUNK } else { chunk };
        Self {
            items: Vec::with_capacity(chunk),
            chunk,
            cleanup: None,
        }
    }

    /// Create an empty registry that runs `cleanup` on every departing record
    pub fn with_cleanup(chunk: usize, cleanup: impl FnMut(&mut T) + Send + 'static) -> Self {
        let mut registry = Self::new(chunk);
        registry.cleanup = Some(Box::new(cleanup));
        registry
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the registry holds no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Allocated slots (never shrinks)
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Append a record at the end
    pub fn append(&mut self, record: T) {
        self.grow_if_full();
        self.items.push(record);
    }

    /// Insert a record at `position`, shifting later records right
    ///
    /// # Panics
    /// Panics if `position > len()`.
    pub fn insert(&mut self, position: usize, record: T) {
        assert!(
            position <= self.items.len(),
            "registry insert at {} out of range (len {})",
            position,
            self.items.len()
        );
        self.grow_if_full();
        self.items.insert(position, record);
    }

    /// Record at `position`
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn nth(&self, position: usize) -> &T {
        self.check_position("nth", position);
        &self.items[position]
    }

    /// Mutable record at `position`
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn nth_mut(&mut self, position: usize) -> &mut T {
        self.check_position("nth_mut", position);
        &mut self.items[position]
    }

    /// Overwrite the record at `position`, handing the old one back
    ///
    /// The cleanup hook does not run: the old record goes back to the caller.
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn replace(&mut self, position: usize, record: T) -> T {
        self.check_position("replace", position);
        std::mem::replace(&mut self.items[position], record)
    }

    /// Remove the record at `position`, running cleanup on it first
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn delete(&mut self, position: usize) {
        self.check_position("delete", position);
        if let Some(cleanup) = self.cleanup.as_mut() {
            cleanup(&mut self.items[position]);
        }
        self.items.remove(position);
    }

    /// Find the position of the record matching `key`
    ///
    /// `compare(key, record)` returns `Ordering::Equal` on a match. A linear
    /// scan starts at `start`. With `sorted`, a binary search runs over the
    /// whole registry instead; sortedness under `compare` is the caller's
    /// responsibility.
    pub fn search<K: ?Sized>(
        &self,
        key: &K,
        compare: impl Fn(&K, &T) -> Ordering,
        start: usize,
        sorted: bool,
    ) -> Option<usize> {
        if sorted {
            // binary_search_by wants record-vs-key, the comparator is key-vs-record
            return self
                .items
                .binary_search_by(|record| compare(key, record).reverse())
                .ok();
        }
        self.items
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, record)| compare(key, record) == Ordering::Equal)
            .map(|(position, _)| position)
    }

    /// Sort records in place
    pub fn sort(&mut self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.items.sort_by(compare);
    }

    /// Visit every record in order
    pub fn for_each(&self, mut visit: impl FnMut(&T)) {
        for record in &self.items {
            visit(record);
        }
    }

    /// Iterate over records in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    fn check_position(&self, op: &str, position: usize) {
        assert!(
            position < self.items.len(),
            "registry {} at {} out of range (len {})",
            op,
            position,
            self.items.len()
        );
    }

    fn grow_if_full(&mut self) {
        if self.items.len() == self.items.capacity() {
            // At least one chunk, at most doubling: keeps append amortized O(1)
            let extra = self.chunk.max(self.items.len());
            self.items.reserve_exact(extra);
        }
    }
}

impl<T> Drop for OrderedRegistry<T> {
    fn drop(&mut self) {
        if let Some(mut cleanup) = self.cleanup.take() {
            while let Some(mut record) = self.items.pop() {
                cleanup(&mut record);
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedRegistry")
            .field("items", &self.items)
            .field("chunk", &self.chunk)
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}
