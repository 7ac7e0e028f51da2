use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Bounded, thread-safe producer-to-consumer handoff with a drop-oldest
/// overload policy.
///
/// `push` may be called concurrently from any producer thread; `try_pop` is
/// meant for the single consumer. Neither blocks: the internal lock is held
/// only for the O(1) operation body. When a push exceeds the capacity, the
/// oldest buffered element is discarded and counted. Dropping is an expected
/// backpressure condition, not an error; FIFO order is preserved among the
/// surviving elements.
#[derive(Debug)]
pub struct HandoffQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl<T> HandoffQueue<T> {
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Create a queue holding at most `capacity` elements.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Append an element, evicting the oldest one when full. Never blocks the
    /// producer beyond the lock-scoped push itself.
    pub fn push(&self, item: T) {
        let mut items = self.lock();
        items.push_back(item);
        if items.len() > self.capacity {
            items.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!("handoff queue full, dropping oldest element");
        }
    }

    /// Remove and return the oldest element, or `None` when empty.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Discard all buffered elements. Called between sessions so stale output
    /// cannot leak into a new one.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of elements discarded by the drop-oldest policy so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        // The queue holds plain values; a panic in a producer cannot leave the
        // deque in an invalid state, so poisoning is recoverable.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let queue = HandoffQueue::new(4);
        for i in 0..4 {
            queue.push(i);
        }
        for i in 0..4 {
            assert_eq!(queue.try_pop(), Some(i));
        }
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_drop_oldest_on_overflow() {
        let capacity = 10;
        let pushes = 25;
        let queue = HandoffQueue::new(capacity);
        for i in 0..pushes {
            queue.push(i);
        }

        assert_eq!(queue.dropped(), (pushes - capacity) as u64);
        assert_eq!(queue.len(), capacity);

        // Survivors are exactly the last `capacity` pushes, in order.
        let mut drained = Vec::new();
        while let Some(i) = queue.try_pop() {
            drained.push(i);
        }
        let expected: Vec<_> = (pushes - capacity..pushes).collect();
        assert_eq!(drained, expected);
    }

    #[test]
    fn test_clear_discards_everything() {
        let queue = HandoffQueue::new(3);
        queue.push("a");
        queue.push("b");
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);
        // Clearing does not touch the drop counter.
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = Arc::new(HandoffQueue::new(8));
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        queue.push(p * 100 + i);
                    }
                })
            })
            .collect();
        for handle in producers {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 8);
        assert_eq!(queue.dropped(), 400 - 8);
    }
}
