//! FIFO work queue that tracks completion, not just removal.
//!
//! An item counts as unfinished from [`WorkQueue::push`] until the consumer
//! that popped it calls [`WorkQueue::task_done`]. [`WorkQueue::wait_until_drained`]
//! returns only once that count reaches zero.

use anyhow::{bail, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

struct QueueState<T> {
    pending: VecDeque<T>,
    unfinished: usize,
    closed: bool,
}

pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    drained: Condvar,
    capacity: Option<usize>,
}

impl<T> WorkQueue<T> {
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// `capacity` bounds the number of items waiting to be popped.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState { pending: VecDeque::new(), unfinished: 0, closed: false }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            drained: Condvar::new(),
            capacity,
        }
    }

    /// Append an item, blocking while a bounded queue is full.
    ///
    /// Fails once the queue has been closed.
    pub fn push(&self, item: T) -> Result<()> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                bail!("queue is closed");
            }
            match self.capacity {
                Some(cap) if state.pending.len() >= cap => self.not_full.wait(&mut state),
                _ => break,
            }
        }
        state.pending.push_back(item);
        state.unfinished += 1;
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block until an item is available. Returns `None` once the queue is
    /// closed and every pending item has been handed out.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.pending.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Mark one popped item as fully processed.
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.unfinished > 0, "task_done called more times than push");
        state.unfinished = state.unfinished.saturating_sub(1);
        if state.unfinished == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until every pushed item has been marked done.
    pub fn wait_until_drained(&self) {
        let mut state = self.state.lock();
        while state.unfinished > 0 {
            self.drained.wait(&mut state);
        }
    }

    /// Refuse further pushes and wake every blocked consumer and producer.
    /// Items already queued are still handed out by `pop`.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Items waiting to be popped.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Items pushed but not yet marked done, popped or not.
    pub fn unfinished(&self) -> usize {
        self.state.lock().unfinished
    }

    /// `(pending, unfinished)` read under a single lock acquisition.
    pub fn counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.pending.len(), state.unfinished)
    }
}
