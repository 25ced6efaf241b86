//! Virtual-clock queue of cancellable delayed continuations.
//!
//! The scheduler never sleeps. Its owner advances the clock with the time
//! that actually passed and drains whatever became due, which keeps every
//! delayed behaviour (paced dialogue, scripted opponents, rerolls) testable
//! without a real timer.
use std::collections::BTreeMap;
use std::time::Duration;

/// Handle returned by [`Scheduler::schedule`], used to cancel the task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

/// Tasks of type `T` ordered by due time, then by scheduling order.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), T>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queues `task` to become due `delay` from now.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.insert((self.now + delay, id), task);
        TaskId(id)
    }

    /// Removes a pending task. Returns `None` if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let key = *self.queue.keys().find(|(_, seq)| *seq == id.0)?;
        self.queue.remove(&key)
    }

    /// Cancels every pending task matching `predicate`. Returns how many were removed.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, task| !predicate(task));
        before - self.queue.len()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.queue.keys().any(|(_, seq)| *seq == id.0)
    }

    /// Time until the earliest task is due, or `None` when idle.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue
            .keys()
            .next()
            .map(|(due, _)| due.saturating_sub(self.now))
    }

    /// Moves the virtual clock forward.
    pub fn advance(&mut self, elapsed: Duration) {
        self.now += elapsed;
    }

    /// Pops the earliest task that is due at the current virtual time.
    ///
    /// Call repeatedly: running one task may schedule another that is
    /// already due.
    pub fn pop_due(&mut self) -> Option<(TaskId, T)> {
        let (&(due, seq), _) = self.queue.first_key_value()?;
        if due > self.now {
            return None;
        }
        self.queue
            .remove(&(due, seq))
            .map(|task| (TaskId(seq), task))
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
