//! Claim strategies
//!
//! A claim strategy allocates sequence ranges to publishers and keeps them
//! from lapping the slowest consumer. The wrap point of a claim ending at
//! `s` is `s - N`: the claim is safe once every gating sequence has reached
//! it. The strategy also owns the publication ordering step that runs
//! between the payload store and the moment consumers may observe it.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_utils::CachePadded;

use crate::disruptor::sequence::get_minimum_sequence;
use crate::disruptor::{is_power_of_two, Sequence, INITIAL_CURSOR_VALUE};

/// Spin iterations between yields while waiting for a publication slot.
const SPIN_TRIES: u32 = 100;

/// Strategy for allocating sequence ranges to publishers.
pub trait ClaimStrategy: Send + Sync + 'static {
    /// Build a strategy for a ring of `buffer_size` slots.
    fn with_buffer_size(buffer_size: usize) -> Self
    where
        Self: Sized;

    /// Reserve a contiguous range of `delta` sequences, returning the last
    /// sequence of the range.
    ///
    /// Blocks (spinning or yielding) while the wrap point of the range is
    /// ahead of the minimum gating sequence, so claimed slots never overlap
    /// unread ones.
    fn increment_and_get(&self, delta: i64, cursor: &Sequence, dependents: &[Arc<Sequence>])
        -> i64;

    /// Non-blocking capacity probe. A true result is only an indication;
    /// another publisher may take the capacity first.
    fn has_available_capacity(
        &self,
        required: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
    ) -> bool;

    /// The ordering step between the payload store and consumer
    /// visibility. Runs inside `Sequencer::publish`.
    fn synchronize_publishing(&self, sequence: i64, cursor: &Sequence, delta: i64);

    /// Clamp `available` to the highest sequence with no publication gap
    /// at or after `lower`. Identity for strategies whose cursor only ever
    /// covers fully published sequences.
    fn highest_published(&self, _lower: i64, available: i64) -> i64 {
        available
    }
}

/// Claim strategy for exactly one publisher thread.
///
/// The claim counter and the cached gating observation are only ever
/// touched by that publisher, so all accesses are relaxed; the one
/// release that matters is the cursor store in `synchronize_publishing`.
#[derive(Debug)]
pub struct SingleProducerClaimStrategy {
    buffer_size: i64,
    claimed: CachePadded<AtomicI64>,
    cached_gating: CachePadded<AtomicI64>,
}

impl SingleProducerClaimStrategy {
    fn wait_for_free_slot(&self, sequence: i64, dependents: &[Arc<Sequence>]) {
        let wrap_point = sequence - self.buffer_size;
        if self.cached_gating.load(Ordering::Relaxed) < wrap_point {
            let mut min_sequence = get_minimum_sequence(dependents);
            while min_sequence < wrap_point {
                thread::yield_now();
                min_sequence = get_minimum_sequence(dependents);
            }
            self.cached_gating.store(min_sequence, Ordering::Relaxed);
        }
    }
}

impl ClaimStrategy for SingleProducerClaimStrategy {
    fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size as i64,
            claimed: CachePadded::new(AtomicI64::new(INITIAL_CURSOR_VALUE)),
            cached_gating: CachePadded::new(AtomicI64::new(INITIAL_CURSOR_VALUE)),
        }
    }

    fn increment_and_get(
        &self,
        delta: i64,
        _cursor: &Sequence,
        dependents: &[Arc<Sequence>],
    ) -> i64 {
        let next_sequence = self.claimed.load(Ordering::Relaxed) + delta;
        self.claimed.store(next_sequence, Ordering::Relaxed);
        self.wait_for_free_slot(next_sequence, dependents);
        next_sequence
    }

    fn has_available_capacity(
        &self,
        required: i64,
        _cursor: &Sequence,
        dependents: &[Arc<Sequence>],
    ) -> bool {
        let wrap_point = self.claimed.load(Ordering::Relaxed) + required - self.buffer_size;
        if wrap_point > self.cached_gating.load(Ordering::Relaxed) {
            let min_sequence = get_minimum_sequence(dependents);
            self.cached_gating.store(min_sequence, Ordering::Relaxed);
            if wrap_point > min_sequence {
                return false;
            }
        }
        true
    }

    fn synchronize_publishing(&self, sequence: i64, cursor: &Sequence, _delta: i64) {
        cursor.set(sequence);
    }
}

/// Claim strategy for multiple publishers with serialized publication.
///
/// Claims are a fetch-add on a shared counter; publication spins until the
/// cursor has reached the start of the claimed range, so the cursor always
/// advances contiguously in claim order. One publisher that claims and
/// stalls holds the cursor back for everyone who claimed after it.
#[derive(Debug)]
pub struct SerializedMultiProducerClaimStrategy {
    buffer_size: i64,
    claimed: CachePadded<AtomicI64>,
    cached_gating: CachePadded<AtomicI64>,
}

impl SerializedMultiProducerClaimStrategy {
    fn wait_for_free_slot(&self, sequence: i64, dependents: &[Arc<Sequence>]) {
        let wrap_point = sequence - self.buffer_size;
        if self.cached_gating.load(Ordering::Acquire) < wrap_point {
            let mut min_sequence = get_minimum_sequence(dependents);
            while min_sequence < wrap_point {
                thread::yield_now();
                min_sequence = get_minimum_sequence(dependents);
            }
            self.cached_gating.store(min_sequence, Ordering::Release);
        }
    }
}

impl ClaimStrategy for SerializedMultiProducerClaimStrategy {
    fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size as i64,
            claimed: CachePadded::new(AtomicI64::new(INITIAL_CURSOR_VALUE)),
            cached_gating: CachePadded::new(AtomicI64::new(INITIAL_CURSOR_VALUE)),
        }
    }

    fn increment_and_get(
        &self,
        delta: i64,
        _cursor: &Sequence,
        dependents: &[Arc<Sequence>],
    ) -> i64 {
        let next_sequence = self.claimed.fetch_add(delta, Ordering::AcqRel) + delta;
        self.wait_for_free_slot(next_sequence, dependents);
        next_sequence
    }

    fn has_available_capacity(
        &self,
        required: i64,
        _cursor: &Sequence,
        dependents: &[Arc<Sequence>],
    ) -> bool {
        let wrap_point = self.claimed.load(Ordering::Acquire) + required - self.buffer_size;
        if wrap_point > self.cached_gating.load(Ordering::Acquire) {
            let min_sequence = get_minimum_sequence(dependents);
            self.cached_gating.store(min_sequence, Ordering::Release);
            if wrap_point > min_sequence {
                return false;
            }
        }
        true
    }

    fn synchronize_publishing(&self, sequence: i64, cursor: &Sequence, delta: i64) {
        let expected_sequence = sequence - delta;
        let mut counter = SPIN_TRIES;

        while cursor.get() != expected_sequence {
            counter -= 1;
            if counter == 0 {
                counter = SPIN_TRIES;
                thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
        }

        cursor.set(sequence);
    }
}

/// Claim strategy for multiple publishers committing independently.
///
/// There is no separate claim counter: claiming CAS-advances the cursor
/// itself, and publishing stamps a per-slot availability ring with the
/// generation of the published sequence. Publishers never wait for each
/// other, but the cursor now covers sequences that may not all be
/// published yet, so consumers clamp what they observed through
/// [`ClaimStrategy::highest_published`].
#[derive(Debug)]
pub struct ConcurrentMultiProducerClaimStrategy {
    buffer_size: i64,
    index_mask: i64,
    index_shift: u32,
    /// One generation flag per slot; `sequence >> index_shift` once the
    /// slot holds that sequence's payload, -1 before the first lap.
    available: Box<[AtomicI64]>,
    cached_gating: CachePadded<AtomicI64>,
}

impl ConcurrentMultiProducerClaimStrategy {
    fn availability_flag(&self, sequence: i64) -> i64 {
        sequence >> self.index_shift
    }

    fn set_available(&self, sequence: i64) {
        let index = (sequence & self.index_mask) as usize;
        self.available[index].store(self.availability_flag(sequence), Ordering::Release);
    }

    /// Whether `sequence` has been published for the current lap of the
    /// ring.
    pub fn is_available(&self, sequence: i64) -> bool {
        let index = (sequence & self.index_mask) as usize;
        self.available[index].load(Ordering::Acquire) == self.availability_flag(sequence)
    }
}

impl ClaimStrategy for ConcurrentMultiProducerClaimStrategy {
    fn with_buffer_size(buffer_size: usize) -> Self {
        assert!(
            is_power_of_two(buffer_size),
            "buffer size must be a positive power of 2, got {buffer_size}"
        );

        let available = (0..buffer_size)
            .map(|_| AtomicI64::new(-1))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            buffer_size: buffer_size as i64,
            index_mask: (buffer_size - 1) as i64,
            index_shift: buffer_size.trailing_zeros(),
            available,
            cached_gating: CachePadded::new(AtomicI64::new(INITIAL_CURSOR_VALUE)),
        }
    }

    fn increment_and_get(
        &self,
        delta: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
    ) -> i64 {
        loop {
            let current = cursor.get();
            let next_sequence = current + delta;
            let wrap_point = next_sequence - self.buffer_size;
            let cached = self.cached_gating.load(Ordering::Acquire);

            if wrap_point > cached || cached > current {
                // Refresh the gating observation against the cursor value
                // this iteration is based on, then retry the whole claim.
                let min_sequence = get_minimum_sequence(dependents).min(current);
                if wrap_point > min_sequence {
                    thread::yield_now();
                    continue;
                }
                self.cached_gating.store(min_sequence, Ordering::Release);
            } else if cursor.compare_and_set(current, next_sequence) {
                return next_sequence;
            }
        }
    }

    fn has_available_capacity(
        &self,
        required: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
    ) -> bool {
        let current = cursor.get();
        let wrap_point = current + required - self.buffer_size;
        let cached = self.cached_gating.load(Ordering::Acquire);

        if wrap_point > cached || cached > current {
            let min_sequence = get_minimum_sequence(dependents).min(current);
            self.cached_gating.store(min_sequence, Ordering::Release);
            if wrap_point > min_sequence {
                return false;
            }
        }
        true
    }

    fn synchronize_publishing(&self, sequence: i64, _cursor: &Sequence, delta: i64) {
        let mut slot = sequence - delta + 1;
        while slot <= sequence {
            self.set_available(slot);
            slot += 1;
        }
    }

    fn highest_published(&self, lower: i64, available: i64) -> i64 {
        let mut sequence = lower;
        while sequence <= available {
            if !self.is_available(sequence) {
                return sequence - 1;
            }
            sequence += 1;
        }
        available
    }
}
