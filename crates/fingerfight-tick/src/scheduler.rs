//! Cancellable deadline queue.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// Handle returned by [`Scheduler::schedule_in`], used to cancel one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// A queue of events keyed by deadline.
///
/// Events with the same deadline fire in scheduling order. One
/// `cancel_all` drops everything pending, which is how a match tears down
/// its intro, results and golden-target timers in one go.
pub struct Scheduler<E> {
    next_id: u64,
    queue: BTreeMap<(Instant, u64), E>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            queue: BTreeMap::new(),
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, deadline: Instant, event: E) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.insert((deadline, id), event);
        trace!(timer = id, pending = self.queue.len(), "timer scheduled");
        TimerId(id)
    }

    pub fn schedule_in(&mut self, delay: Duration, event: E) -> TimerId {
        self.schedule_at(Instant::now() + delay, event)
    }

    /// Removes one pending entry. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|&(_, entry), _| entry != id.0);
        before != self.queue.len()
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Waits for the earliest pending event and removes it. Pends forever
    /// while the queue is empty.
    pub async fn next(&mut self) -> (TimerId, E) {
        loop {
            let Some(deadline) = self.next_deadline() else {
                std::future::pending::<()>().await;
                continue;
            };
            time::sleep_until(deadline).await;
            if let Some(((_, id), event)) = self.queue.pop_first() {
                return (TimerId(id), event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_removes_only_that_entry() {
        let mut s = Scheduler::new();
        let a = s.schedule_in(Duration::from_millis(10), "a");
        let _b = s.schedule_in(Duration::from_millis(20), "b");
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert_eq!(s.len(), 1);
        let (_, event) = s.next().await;
        assert_eq!(event, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_deadline_fires_in_schedule_order() {
        let mut s = Scheduler::new();
        let at = Instant::now() + Duration::from_millis(5);
        s.schedule_at(at, 1);
        s.schedule_at(at, 2);
        assert_eq!(s.next().await.1, 1);
        assert_eq!(s.next().await.1, 2);
        assert!(s.is_empty());
    }
}
