//! Ring buffer storage
//!
//! Pre-allocated circular storage for events. Slot lookup is a mask of the
//! sequence number; there are no bounds checks beyond the mask and no locks.
//! All cross-thread coordination lives in the sequencer and its strategies,
//! which decide who may touch which slot when.

use std::cell::UnsafeCell;

use crate::disruptor::{is_power_of_two, DisruptorError, EventFactory, Result};

/// Fixed-size circular slot storage.
///
/// The slot for sequence `s` is at index `s & (N - 1)`, which is why `N`
/// must be a power of two. Slot contents for sequences that have not been
/// published are undefined from a consumer's point of view; ownership of a
/// slot moves from publisher (between claim and publish) to consumers
/// (after publish, until every gating sequence passes it).
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Box<[UnsafeCell<T>]>,
    index_mask: i64,
}

impl<T> RingBuffer<T> {
    /// Create a ring buffer whose slots are pre-populated by `factory`.
    ///
    /// # Errors
    /// Returns [`DisruptorError::InvalidBufferSize`] unless `buffer_size`
    /// is a positive power of two.
    pub fn new<F>(buffer_size: usize, factory: F) -> Result<Self>
    where
        F: EventFactory<T>,
    {
        if !is_power_of_two(buffer_size) {
            return Err(DisruptorError::InvalidBufferSize(buffer_size));
        }

        let slots: Box<[UnsafeCell<T>]> = (0..buffer_size)
            .map(|_| UnsafeCell::new(factory.new_instance()))
            .collect();

        Ok(Self {
            slots,
            index_mask: (buffer_size - 1) as i64,
        })
    }

    /// Create a ring buffer from fully initialized events.
    ///
    /// # Errors
    /// Returns [`DisruptorError::InvalidBufferSize`] unless the number of
    /// events is a positive power of two.
    pub fn from_events(events: Vec<T>) -> Result<Self> {
        if !is_power_of_two(events.len()) {
            return Err(DisruptorError::InvalidBufferSize(events.len()));
        }

        let index_mask = (events.len() - 1) as i64;
        let slots: Box<[UnsafeCell<T>]> = events.into_iter().map(UnsafeCell::new).collect();

        Ok(Self { slots, index_mask })
    }

    /// Shared reference to the slot for `sequence`.
    ///
    /// Safe for consumers reading sequences at or below the published
    /// horizon they observed through a barrier.
    #[inline]
    pub fn get(&self, sequence: i64) -> &T {
        let index = (sequence & self.index_mask) as usize;
        // SAFETY: the mask keeps the index in bounds.
        let slot = unsafe { self.slots.get_unchecked(index) };
        unsafe { &*slot.get() }
    }

    /// Raw mutable pointer to the slot for `sequence`.
    ///
    /// # Safety
    /// The caller must hold the claim on `sequence`, i.e. be the publisher
    /// that claimed it and not yet published it. Claim ownership is what
    /// guarantees no other thread reads or writes the slot concurrently.
    #[inline]
    pub unsafe fn get_mut_unchecked(&self, sequence: i64) -> *mut T {
        let index = (sequence & self.index_mask) as usize;
        // SAFETY: the mask keeps the index in bounds.
        self.slots.get_unchecked(index).get()
    }

    /// Number of slots.
    pub fn buffer_size(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots as an i64, matching sequence arithmetic.
    pub fn size(&self) -> i64 {
        self.slots.len() as i64
    }
}

// SAFETY: slots use UnsafeCell, but every access is serialized by sequence
// ownership: a publisher writes a slot only between claim and publish, and
// consumers read it only after observing the publish through an acquire
// load. The release/acquire pair on the cursor (or availability flag)
// orders the payload writes before the reads.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send + Sync> Sync for RingBuffer<T> {}
