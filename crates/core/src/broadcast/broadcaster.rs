use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Cell<T> {
    seq: u64,
    value: Option<Arc<T>>,
}

struct Shared<T> {
    cell: Mutex<Cell<T>>,
    subscribers: AtomicUsize,
}

/// Latest-value fan-out for one value type.
///
/// Publishing replaces the current value; it never blocks on consumers
/// and never queues. A consumer that falls behind skips straight to the
/// newest value, which is the right trade for live frames and rolling
/// statistics.
pub struct Broadcaster<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Broadcaster<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                cell: Mutex::new(Cell {
                    seq: 0,
                    value: None,
                }),
                subscribers: AtomicUsize::new(0),
            }),
        }
    }

    /// Replaces the current value. O(1) regardless of subscriber count.
    pub fn publish(&self, value: T) {
        let mut cell = self.shared.cell.lock().unwrap();
        cell.seq += 1;
        cell.value = Some(Arc::new(value));
    }

    /// The most recent published value, if any.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.shared.cell.lock().unwrap().value.clone()
    }

    /// A new subscription that only sees values published after the
    /// values it has already polled.
    pub fn subscribe(&self) -> Subscription<T> {
        self.shared.subscribers.fetch_add(1, Ordering::Relaxed);
        Subscription {
            shared: Arc::clone(&self.shared),
            last_seen: self.shared.cell.lock().unwrap().seq,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.load(Ordering::Relaxed)
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Consumer handle. Each poll returns a value at most once and values
/// arrive in publish order; intermediate values may be skipped.
pub struct Subscription<T> {
    shared: Arc<Shared<T>>,
    last_seen: u64,
}

impl<T> Subscription<T> {
    /// The newest value not yet seen by this subscription, or `None`
    /// when nothing new has been published.
    pub fn poll(&mut self) -> Option<Arc<T>> {
        let cell = self.shared.cell.lock().unwrap();
        if cell.seq == self.last_seen {
            return None;
        }
        self.last_seen = cell.seq;
        cell.value.clone()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.shared.subscribers.fetch_sub(1, Ordering::Relaxed);
    }
}
