//! Fixed-capacity circular slot array
//!
//! Occupancy is fully described by `head` (next slot to pop) and `count`;
//! the next slot to push into is `(head + count) % capacity`. The slot array
//! is allocated once and never grows.

use std::collections::TryReserveError;

pub(crate) struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    count: usize,
}

impl<T> RingBuffer<T> {
    /// Allocates `capacity` empty slots, reporting allocation failure instead
    /// of aborting.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize_with(capacity, || None);

        Ok(Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            count: 0,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    #[inline(always)]
    fn index(&self, position: usize) -> usize {
        position % self.slots.len()
    }

    /// Writes `value` into the tail slot. The caller must have checked that
    /// the buffer is not full.
    pub(crate) fn push_back(&mut self, value: T) {
        debug_assert!(self.count < self.slots.len(), "push into full ring");
        let tail = self.index(self.head + self.count);
        debug_assert!(self.slots[tail].is_none());
        self.slots[tail] = Some(value);
        self.count += 1;
    }

    /// Takes the value in the head slot, if any.
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let value = self.slots[self.head].take();
        debug_assert!(value.is_some(), "occupied slot was empty");
        self.head = self.index(self.head + 1);
        self.count -= 1;
        value
    }

    /// Removes every buffered value in FIFO order.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.count);
        while let Some(value) = self.pop_front() {
            out.push(value);
        }
        out
    }
}
