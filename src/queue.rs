//! Task queue shared by the input reader and the workers.
//!
//! Unbounded FIFO behind a single mutex, with a condvar as wake signal.
//! Popping is always "pop if present" under the lock, so an emptiness
//! check is never part of the dequeue path.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::request::ConversionRequest;

/// Outcome of a bounded wait for work.
#[derive(Debug, PartialEq, Eq)]
pub enum Popped {
    Item(ConversionRequest),
    /// Timed out with nothing to take.
    Empty,
    /// Closed and fully drained: no more work will arrive.
    Closed,
}

#[derive(Default)]
struct State {
    items: VecDeque<ConversionRequest>,
    closed: bool,
}

/// FIFO of pending requests.
#[derive(Default)]
pub struct TaskQueue {
    state: Mutex<State>,
    notify: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request and wake one waiting worker.
    ///
    /// Returns false (and drops the request) once the queue is closed.
    pub fn push(&self, request: ConversionRequest) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.items.push_back(request);
        self.notify.notify_one();
        true
    }

    /// Take the head of the queue if there is one.
    pub fn try_pop(&self) -> Option<ConversionRequest> {
        self.state.lock().items.pop_front()
    }

    /// Wait up to `timeout` for work, then take the head if present.
    pub fn pop_timeout(&self, timeout: Duration) -> Popped {
        let mut state = self.state.lock();
        if state.items.is_empty() && !state.closed {
            self.notify.wait_for(&mut state, timeout);
        }
        match state.items.pop_front() {
            Some(item) => Popped::Item(item),
            None if state.closed => Popped::Closed,
            None => Popped::Empty,
        }
    }

    /// Refuse further pushes and wake every waiter.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_all();
    }

    /// Wake every waiter without changing state.
    pub fn wake_all(&self) {
        self.notify.notify_all();
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Snapshot only; may be stale by the time the caller looks at it.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }
}
