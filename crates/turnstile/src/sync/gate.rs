//! One-shot start gate

use parking_lot::{Condvar, Mutex};

/// Broadcast barrier holding spawned tasks until release
///
/// Starts closed. [`open`](StartGate::open) is a one-way transition that
/// wakes every parked thread; threads arriving later pass straight through.
#[derive(Debug, Default)]
pub struct StartGate {
    opened: Mutex<bool>,
    cond: Condvar,
}

impl StartGate {
    /// Create a closed gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the gate is open
    pub fn wait(&self) {
        let mut opened = self.opened.lock();
        while !*opened {
            self.cond.wait(&mut opened);
        }
    }

    /// Open the gate and wake every waiter
    ///
    /// Returns false if the gate was already open.
    pub fn open(&self) -> bool {
        let mut opened = self.opened.lock();
        if *opened {
            return false;
        }
        *opened = true;
        self.cond.notify_all();
        true
    }

    /// Whether the gate has been opened
    pub fn is_open(&self) -> bool {
        *self.opened.lock()
    }
}
