//! A bounded FIFO queue with blocking backpressure and cooperative shutdown.
//!
//! Generalized from the original's fixed-size ring buffer plus two condvars
//! (`command_buffer_t` in `babble_server.c`) into an owning value-queue: this
//! avoids the raw-pointer-into-the-ring race noted in `spec.md` §9 (Open
//! Question 2), since `dequeue` only ever hands back a value it already
//! removed from the buffer under the mutex.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::error::QueueError;

struct State<T> {
    items: VecDeque<T>,
    running: bool,
}

/// Fixed-capacity FIFO queue shared between one producer population (sessions)
/// and one consumer (an executor).
pub struct Queue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> Queue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "queue capacity must be at least 1");
        Queue {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                running: true,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Block until there is room, then push `item`. Returns `ShutDown` without
    /// publishing the item if shutdown is observed while waiting or on entry.
    pub fn enqueue(&self, item: T) -> Result<(), QueueError> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        while state.items.len() == self.capacity && state.running {
            state = self.not_full.wait(state).unwrap_or_else(|p| p.into_inner());
        }
        if !state.running {
            return Err(QueueError::ShutDown);
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block until an item is available, then pop and return it. Returns
    /// `ShutDown` once the queue has been drained and shutdown has fired.
    pub fn dequeue(&self) -> Result<T, QueueError> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        while state.items.is_empty() && state.running {
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(|p| p.into_inner());
        }
        let item = match state.items.pop_front() {
            Some(item) => item,
            None => return Err(QueueError::ShutDown),
        };
        drop(state);
        self.not_full.notify_one();
        Ok(item)
    }

    /// Flip the running flag and wake every waiter so blocked producers and
    /// consumers observe shutdown instead of blocking forever.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.running = false;
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order_is_preserved() {
        let q = Queue::new(4);
        for i in 0..4 {
            q.enqueue(i).unwrap();
        }
        for i in 0..4 {
            assert_eq!(q.dequeue().unwrap(), i);
        }
    }

    #[test]
    fn enqueue_blocks_when_full_and_unblocks_after_dequeue() {
        let q = Arc::new(Queue::new(1));
        q.enqueue(1).unwrap();

        let blocked = Arc::new(AtomicBool::new(true));
        let qc = q.clone();
        let bc = blocked.clone();
        let producer = thread::spawn(move || {
            qc.enqueue(2).unwrap();
            bc.store(false, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(50));
        assert!(blocked.load(Ordering::SeqCst), "enqueue should still be blocked");

        assert_eq!(q.dequeue().unwrap(), 1);
        producer.join().unwrap();
        assert!(!blocked.load(Ordering::SeqCst));
        assert_eq!(q.dequeue().unwrap(), 2);
    }

    #[test]
    fn shutdown_during_blocked_enqueue_returns_without_publishing() {
        let q = Arc::new(Queue::new(1));
        q.enqueue(1).unwrap();

        let qc = q.clone();
        let producer = thread::spawn(move || qc.enqueue(2));

        thread::sleep(Duration::from_millis(50));
        q.shutdown();

        assert_eq!(producer.join().unwrap(), Err(QueueError::ShutDown));
    }

    #[test]
    fn dequeue_on_empty_shutdown_queue_returns_shutdown() {
        let q: Queue<i32> = Queue::new(4);
        q.shutdown();
        assert_eq!(q.dequeue(), Err(QueueError::ShutDown));
    }

    #[test]
    fn occupancy_never_exceeds_capacity() {
        let q = Queue::new(2);
        q.enqueue(1).unwrap();
        q.enqueue(2).unwrap();
        assert_eq!(q.len(), 2);
    }
}
