//! Completion barrier: live-task counter plus a done semaphore

use crate::error::ThreadError;
use crate::sync::SemaphoreHandle;
use parking_lot::Mutex;

struct BarrierState {
    /// Tasks spawned and not yet finished
    live: usize,
    /// Cleared once a wait has consumed the barrier
    done: Option<SemaphoreHandle>,
}

/// "Wait until nobody is left" primitive
///
/// [`enter`](Self::enter) and [`leave`](Self::leave) move the live count
/// under the barrier lock; the leave that brings it to zero signals the done
/// semaphore inside the same critical section. A barrier is good for one
/// [`wait`](Self::wait).
pub struct CompletionBarrier {
    state: Mutex<BarrierState>,
}

impl CompletionBarrier {
    /// Create a barrier signalling through `done` (which should start at 0)
    pub fn new(done: SemaphoreHandle) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                live: 0,
                done: Some(done),
            }),
        }
    }

    /// Count one more live task
    pub fn enter(&self) {
        self.state.lock().live += 1;
    }

    /// Count one task finished, signalling when none are left
    ///
    /// Returns true when this call brought the count to zero.
    pub fn leave(&self) -> bool {
        let mut state = self.state.lock();
        debug_assert!(state.live > 0, "completion barrier left more often than entered");
        state.live = state.live.saturating_sub(1);
        if state.live > 0 {
            return false;
        }
        if let Some(done) = state.done.as_ref() {
            done.signal();
        }
        true
    }

    /// Current live count
    pub fn live(&self) -> usize {
        self.state.lock().live
    }

    /// The done semaphore, if the barrier has not been consumed
    pub fn done_semaphore(&self) -> Option<SemaphoreHandle> {
        self.state.lock().done.clone()
    }

    /// Block until the live count is zero, then consume the barrier
    ///
    /// Returns the done semaphore so the caller can dispose of it. A stale
    /// signal from an earlier trip through zero only costs another loop.
    pub fn wait(&self) -> Result<SemaphoreHandle, ThreadError> {
        let done = self.done_semaphore().ok_or(ThreadError::BarrierConsumed)?;
        loop {
            {
                let mut state = self.state.lock();
                if state.live == 0 {
                    return state.done.take().ok_or(ThreadError::BarrierConsumed);
                }
            }
            done.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_with_no_tasks_returns() {
        let barrier = CompletionBarrier::new(SemaphoreHandle::new(0));
        assert!(barrier.wait().is_ok());
    }

    #[test]
    fn test_second_wait_is_rejected() {
        let barrier = CompletionBarrier::new(SemaphoreHandle::new(0));
        barrier.wait().unwrap();
        assert_eq!(barrier.wait().unwrap_err(), ThreadError::BarrierConsumed);
        assert!(barrier.done_semaphore().is_none());
    }

    #[test]
    fn test_leave_signals_at_zero() {
        let done = SemaphoreHandle::new(0);
        let barrier = CompletionBarrier::new(done.clone());

        barrier.enter();
        barrier.enter();
        assert_eq!(barrier.live(), 2);

        assert!(!barrier.leave());
        assert_eq!(done.value(), 0);
        assert!(barrier.leave());
        assert_eq!(done.value(), 1);
    }

    #[test]
    fn test_wait_survives_stale_signal() {
        let barrier = Arc::new(CompletionBarrier::new(SemaphoreHandle::new(0)));

        // Trip through zero before anyone waits, then go live again
        barrier.enter();
        barrier.leave();
        barrier.enter();

        let waiter = {
            let barrier = barrier.clone();
            thread::spawn(move || barrier.wait().map(|_| ()))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        barrier.leave();
        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn test_wait_blocks_until_last_leave() {
        let barrier = Arc::new(CompletionBarrier::new(SemaphoreHandle::new(0)));
        for _ in 0..3 {
            barrier.enter();
        }

        let workers: Vec<_> = (0..3)
            .map(|i| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(5 * (i + 1)));
                    barrier.leave();
                })
            })
            .collect();

        barrier.wait().unwrap();
        assert_eq!(barrier.live(), 0);
        for worker in workers {
            worker.join().unwrap();
        }
    }
}
