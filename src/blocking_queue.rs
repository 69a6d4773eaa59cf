//! Bounded blocking FIFO handoff queue
//!
//! A fixed-capacity circular buffer guarded by one mutex, with two condition
//! variables scoped to that mutex: `not_full` wakes producers and
//! `not_empty` wakes consumers. Both are broadcast on interrupt and on
//! terminate.
//!
//! Blocking calls remember the interrupt epoch they started in. After every
//! wakeup they re-check termination and whether they can make progress,
//! then whether the epoch moved since the call began, and finally whether
//! the deadline passed. They go back to sleep only when none of these hold.
//!
//! A push on a terminated queue fails even if a slot is free. A pop on a
//! terminated queue still drains buffered items before reporting
//! end-of-stream.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::common::{remaining, SizeSnapshot, WaitTime};
use crate::error::{CreateError, PopError, PushError};
use crate::ring::RingBuffer;
use crate::trace::{debug, trace};

/// State guarded by the queue lock.
struct Inner<T> {
    ring: RingBuffer<T>,
    /// Once set, never cleared.
    closed: bool,
    /// Bumped by every `interrupt_all`. Only used to classify wakeups.
    interrupt_epoch: u64,
}

/// A thread-safe bounded FIFO queue with blocking, timed and non-blocking
/// push and pop, plus queue-wide interrupt and terminate.
///
/// Share it between threads with `Arc`. Every method takes `&self`.
///
/// ```
/// use blocking_queue_rs::{BlockingQueue, PopError, PushError};
///
/// let q = BlockingQueue::new(2).unwrap();
/// q.push("a").unwrap();
/// q.push("b").unwrap();
/// assert_eq!(q.try_push("c"), Err(PushError::Full("c")));
/// assert_eq!(q.pop(), Ok("a"));
///
/// q.terminate();
/// assert_eq!(q.pop(), Ok("b"));
/// assert_eq!(q.pop(), Err(PopError::EndOfStream));
/// ```
pub struct BlockingQueue<T> {
    inner: Mutex<Inner<T>>,
    /// Signalled when an item leaves the buffer.
    not_full: Condvar,
    /// Signalled when an item enters the buffer.
    not_empty: Condvar,
    size: SizeSnapshot,
    capacity: u32,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// [`CreateError::ZeroCapacity`] if `capacity` is zero, and
    /// [`CreateError::Alloc`] if the slot array cannot be allocated.
    pub fn new(capacity: u32) -> Result<Self, CreateError> {
        if capacity == 0 {
            return Err(CreateError::ZeroCapacity);
        }
        let ring = RingBuffer::with_capacity(capacity as usize)
            .map_err(|source| CreateError::Alloc { capacity, source })?;
        debug_assert_eq!(ring.capacity(), capacity as usize);

        debug!(capacity, "queue created");

        Ok(Self {
            inner: Mutex::new(Inner {
                ring,
                closed: false,
                interrupt_epoch: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            size: SizeSnapshot::new(),
            capacity,
        })
    }

    /// Inserts `item`, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// `EndOfStream` once the queue is terminated, `Interrupted` if
    /// [`interrupt_all`](Self::interrupt_all) ran while this call was blocked
    /// and space is still unavailable. The item is handed back either way.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        self.push_until(item, None)
    }

    /// Like [`push`](Self::push) but gives up after `wait`.
    ///
    /// `WaitTime::NoWait` never blocks and reports a full queue as
    /// `TimedOut`. `WaitTime::Forever` is the same as `push`.
    pub fn timed_push(&self, item: T, wait: impl Into<WaitTime>) -> Result<(), PushError<T>> {
        let deadline = wait.into().deadline_from(Instant::now());
        self.push_until(item, deadline)
    }

    /// Inserts `item` only if there is room right now.
    ///
    /// # Errors
    ///
    /// `EndOfStream` once terminated, otherwise `Full` if no slot is free.
    pub fn try_push(&self, item: T) -> Result<(), PushError<T>> {
        let guard = self.lock();
        if guard.closed {
            return Err(PushError::EndOfStream(item));
        }
        if guard.ring.is_full() {
            return Err(PushError::Full(item));
        }
        self.commit_push(guard, item);
        Ok(())
    }

    /// Removes the oldest item, blocking while the queue is empty.
    ///
    /// # Errors
    ///
    /// `EndOfStream` once the queue is terminated and drained, `Interrupted`
    /// if [`interrupt_all`](Self::interrupt_all) ran while this call was
    /// blocked and the queue is still empty.
    pub fn pop(&self) -> Result<T, PopError> {
        self.pop_until(None)
    }

    /// Like [`pop`](Self::pop) but gives up after `wait`.
    ///
    /// `WaitTime::NoWait` never blocks and reports an empty queue as
    /// `TimedOut`. `WaitTime::Forever` is the same as `pop`.
    pub fn timed_pop(&self, wait: impl Into<WaitTime>) -> Result<T, PopError> {
        let deadline = wait.into().deadline_from(Instant::now());
        self.pop_until(deadline)
    }

    /// Removes the oldest item only if one is buffered right now.
    ///
    /// # Errors
    ///
    /// `Empty` if nothing is buffered, or `EndOfStream` if additionally the
    /// queue has been terminated.
    pub fn try_pop(&self) -> Result<T, PopError> {
        let mut guard = self.lock();
        match guard.ring.pop_front() {
            Some(item) => {
                self.commit_pop(guard);
                Ok(item)
            }
            None if guard.closed => Err(PopError::EndOfStream),
            None => Err(PopError::Empty),
        }
    }

    /// Number of buffered items, read without taking the lock.
    ///
    /// This is a monitoring snapshot. It may be stale by the time it returns
    /// and must not drive control flow; use the `try_*` calls for that.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size.load()
    }

    /// Snapshot check for emptiness, with the same caveats as [`size`](Self::size).
    #[inline]
    pub fn was_empty(&self) -> bool {
        self.size() == 0
    }

    /// Snapshot check for fullness, with the same caveats as [`size`](Self::size).
    #[inline]
    pub fn was_full(&self) -> bool {
        self.size() == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns true once [`terminate`](Self::terminate) has been called.
    pub fn is_terminated(&self) -> bool {
        self.lock().closed
    }

    /// Wakes every thread currently blocked in a push or pop.
    ///
    /// A woken call that still cannot make progress returns `Interrupted`;
    /// one whose condition now holds completes normally. Buffered items and
    /// the terminated flag are untouched.
    pub fn interrupt_all(&self) {
        let mut guard = self.lock();
        guard.interrupt_epoch = guard.interrupt_epoch.wrapping_add(1);
        debug!(epoch = guard.interrupt_epoch, "interrupting blocked waiters");
        self.not_full.notify_all();
        self.not_empty.notify_all();
        drop(guard);
    }

    /// Permanently closes the queue and wakes every blocked caller.
    ///
    /// All current and future pushes fail with `EndOfStream`. Pops keep
    /// returning buffered items until the queue is drained, then fail with
    /// `EndOfStream`. Calling this more than once has no further effect.
    pub fn terminate(&self) {
        let mut guard = self.lock();
        if !guard.closed {
            guard.closed = true;
            debug!(buffered = guard.ring.len(), "queue terminated");
        }
        self.not_full.notify_all();
        self.not_empty.notify_all();
        drop(guard);
    }

    /// Tears the queue down and hands back whatever was still buffered, in
    /// FIFO order.
    ///
    /// Taking `self` by value means no other thread can still be using the
    /// queue. Dropping the queue instead drops the remaining items.
    pub fn destroy(self) -> Vec<T> {
        let mut inner = self
            .inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let remaining = inner.ring.drain();
        debug_assert!(inner.ring.is_empty());
        debug!(remaining = remaining.len(), "queue destroyed");
        remaining
    }

    fn push_until(&self, item: T, deadline: Option<Instant>) -> Result<(), PushError<T>> {
        let mut guard = self.lock();
        let epoch = guard.interrupt_epoch;

        loop {
            if guard.closed {
                trace!("push observed end of stream");
                return Err(PushError::EndOfStream(item));
            }
            if !guard.ring.is_full() {
                self.commit_push(guard, item);
                return Ok(());
            }
            if guard.interrupt_epoch != epoch {
                trace!("push interrupted");
                return Err(PushError::Interrupted(item));
            }
            let budget = remaining(deadline);
            if budget == Some(Duration::ZERO) {
                trace!("push timed out");
                return Err(PushError::TimedOut(item));
            }
            guard = self.wait(&self.not_full, guard, budget);
        }
    }

    fn pop_until(&self, deadline: Option<Instant>) -> Result<T, PopError> {
        let mut guard = self.lock();
        let epoch = guard.interrupt_epoch;

        loop {
            if let Some(item) = guard.ring.pop_front() {
                self.commit_pop(guard);
                return Ok(item);
            }
            if guard.closed {
                trace!("pop observed end of stream");
                return Err(PopError::EndOfStream);
            }
            if guard.interrupt_epoch != epoch {
                trace!("pop interrupted");
                return Err(PopError::Interrupted);
            }
            let budget = remaining(deadline);
            if budget == Some(Duration::ZERO) {
                trace!("pop timed out");
                return Err(PopError::TimedOut);
            }
            guard = self.wait(&self.not_empty, guard, budget);
        }
    }

    fn commit_push(&self, mut guard: MutexGuard<'_, Inner<T>>, item: T) {
        guard.ring.push_back(item);
        self.publish_size(&guard);
        drop(guard);
        self.not_empty.notify_one();
    }

    /// Called with the item already taken from the ring.
    fn commit_pop(&self, guard: MutexGuard<'_, Inner<T>>) {
        self.publish_size(&guard);
        drop(guard);
        self.not_full.notify_one();
    }

    #[inline]
    fn publish_size(&self, inner: &Inner<T>) {
        let count = inner.ring.len();
        debug_assert!(count <= self.capacity as usize, "count exceeds capacity");
        // count <= capacity, which is a u32
        self.size.publish(count as u32);
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // State is consistent between lock releases, so a panic elsewhere
        // does not invalidate it.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sleeps on `cond` for at most `budget`, or indefinitely when `None`.
    /// Spurious and timed-out wakeups are indistinguishable here; callers
    /// re-check their predicate and deadline.
    fn wait<'a>(
        &self,
        cond: &Condvar,
        guard: MutexGuard<'a, Inner<T>>,
        budget: Option<Duration>,
    ) -> MutexGuard<'a, Inner<T>> {
        match budget {
            None => cond
                .wait(guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            Some(budget) => match cond.wait_timeout(guard, budget) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            },
        }
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("capacity", &self.capacity)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            BlockingQueue::<u32>::new(0),
            Err(CreateError::ZeroCapacity)
        ));
    }

    #[test]
    fn capacity_two_scenario() {
        let q = BlockingQueue::new(2).unwrap();

        assert_eq!(q.push('A'), Ok(()));
        assert_eq!(q.push('B'), Ok(()));
        assert_eq!(q.try_push('C'), Err(PushError::Full('C')));
        assert_eq!(q.pop(), Ok('A'));
        assert_eq!(q.try_push('C'), Ok(()));
        assert_eq!(q.pop(), Ok('B'));
        assert_eq!(q.pop(), Ok('C'));
        assert_eq!(q.try_pop(), Err(PopError::Empty));
    }

    #[test]
    fn terminated_empty_queue() {
        let q = BlockingQueue::new(1).unwrap();
        q.terminate();

        assert_eq!(q.push('X'), Err(PushError::EndOfStream('X')));
        assert_eq!(q.try_pop(), Err(PopError::EndOfStream));
        assert!(q.is_terminated());
    }

    #[test]
    fn terminate_is_idempotent() {
        let q = BlockingQueue::new(2).unwrap();
        q.push(1).unwrap();
        q.terminate();
        q.terminate();

        assert_eq!(q.try_push(2), Err(PushError::EndOfStream(2)));
        assert_eq!(q.pop(), Ok(1));
        assert_eq!(q.pop(), Err(PopError::EndOfStream));
    }

    #[test]
    fn size_follows_pushes_and_pops() {
        let q = BlockingQueue::new(3).unwrap();
        assert!(q.was_empty());
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.size(), 2);
        q.push(3).unwrap();
        assert!(q.was_full());
        q.try_pop().unwrap();
        assert_eq!(q.size(), 2);
    }

    #[test]
    fn no_wait_reports_timeout_without_blocking() {
        let q = BlockingQueue::new(1).unwrap();
        assert_eq!(q.timed_pop(WaitTime::NoWait), Err(PopError::TimedOut));
        q.push(5).unwrap();
        assert_eq!(q.timed_push(6, 0), Err(PushError::TimedOut(6)));
        assert_eq!(q.size(), 1);
    }

    #[test]
    fn interrupt_without_waiters_is_harmless() {
        let q = BlockingQueue::new(1).unwrap();
        q.interrupt_all();
        q.push(9).unwrap();
        assert_eq!(q.pop(), Ok(9));
    }

    #[test]
    fn destroy_returns_leftovers_in_order() {
        let q = BlockingQueue::new(4).unwrap();
        for i in 0..3 {
            q.push(i).unwrap();
        }
        q.pop().unwrap();
        assert_eq!(q.destroy(), vec![1, 2]);
    }

    #[test]
    fn blocked_pop_receives_item() {
        let q = Arc::new(BlockingQueue::new(1).unwrap());
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop())
        };
        thread::sleep(Duration::from_millis(20));
        q.push(42).unwrap();
        assert_eq!(consumer.join().unwrap(), Ok(42));
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let q = Arc::new(BlockingQueue::new(2).unwrap());
        q.push(1).unwrap();

        let poisoner = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                let _guard = q.inner.lock().unwrap();
                panic!("poison the queue lock");
            })
        };
        assert!(poisoner.join().is_err());

        q.push(2).unwrap();
        assert_eq!(q.pop(), Ok(1));
        assert_eq!(q.pop(), Ok(2));
    }
}
