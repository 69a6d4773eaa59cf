//! # blocking_queue_rs
//!
//! A bounded, thread-safe FIFO handoff queue for coordinating producer and
//! consumer threads.
//!
//! Producers block, time out, or fail immediately when the queue is full;
//! consumers do the same when it is empty. Any thread may interrupt every
//! blocked waiter at once, or terminate the queue so that pushes fail and
//! pops drain what is left before reporting end-of-stream.

mod common;
mod ring;

pub mod blocking_queue;
pub mod error;
pub mod trace;

// Re-exports for convenience
pub use blocking_queue::BlockingQueue;
pub use common::{WaitTime, WAIT_FOREVER, WAIT_NONE};
pub use error::{CreateError, PopError, PushError};
pub use trace::init_tracing;
