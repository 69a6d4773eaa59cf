//! Outcomes of queue operations that did not make progress.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

/// Errors that prevent a queue from being created.
#[derive(Debug, Error)]
pub enum CreateError {
    /// A queue must hold at least one item.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
    /// The slot array could not be allocated.
    #[error("failed to allocate a queue of capacity {capacity}: {source}")]
    Alloc {
        capacity: u32,
        #[source]
        source: TryReserveError,
    },
}

/// A push that did not enqueue its item. The item is handed back.
///
/// `Full` only comes from [`try_push`](crate::BlockingQueue::try_push),
/// `TimedOut` only from [`timed_push`](crate::BlockingQueue::timed_push).
#[derive(Debug, PartialEq, Eq)]
pub enum PushError<T> {
    /// The queue was terminated and will never accept another item.
    EndOfStream(T),
    /// The wait was interrupted before space became available.
    Interrupted(T),
    /// The deadline passed before space became available.
    TimedOut(T),
    /// The queue was at capacity.
    Full(T),
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::EndOfStream(_) => f.write_str("queue has been terminated"),
            PushError::Interrupted(_) => f.write_str("wait for queue space was interrupted"),
            PushError::TimedOut(_) => f.write_str("timed out waiting for queue space"),
            PushError::Full(_) => f.write_str("queue is full"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for PushError<T> {}

impl<T> PushError<T> {
    /// Returns the item that failed to be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            PushError::EndOfStream(item)
            | PushError::Interrupted(item)
            | PushError::TimedOut(item)
            | PushError::Full(item) => item,
        }
    }

    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PushError::EndOfStream(_))
    }

    /// True for outcomes worth retrying: interrupted or timed out.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, PushError::Interrupted(_) | PushError::TimedOut(_))
    }
}

/// A pop that did not return an item.
///
/// `Empty` only comes from [`try_pop`](crate::BlockingQueue::try_pop),
/// `TimedOut` only from [`timed_pop`](crate::BlockingQueue::timed_pop).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopError {
    /// The queue was terminated and has been drained.
    #[error("queue has been terminated and drained")]
    EndOfStream,
    /// The wait was interrupted before an item became available.
    #[error("wait for queue item was interrupted")]
    Interrupted,
    /// The deadline passed before an item became available.
    #[error("timed out waiting for queue item")]
    TimedOut,
    /// The queue held no items.
    #[error("queue is empty")]
    Empty,
}

impl PopError {
    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PopError::EndOfStream)
    }

    /// True for outcomes worth retrying: interrupted or timed out.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, PopError::Interrupted | PopError::TimedOut)
    }
}
