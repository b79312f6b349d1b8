//! Sequencer
//!
//! The composition root: ring storage, cursor, claim strategy, wait
//! strategy, and the set of gating sequences, stitched together behind the
//! claim/publish/barrier surface that publishers and consumers use.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::disruptor::sequence::SequenceGroup;
use crate::disruptor::{
    is_power_of_two, ClaimStrategy, ConcurrentMultiProducerClaimStrategy, DisruptorError,
    EventFactory, EventTranslator, Result, RingBuffer, Sequence, SequenceBarrier,
    SerializedMultiProducerClaimStrategy, SingleProducerClaimStrategy, WaitStrategy,
};

/// A claimed contiguous range of sequences.
///
/// Ranges larger than the ring are clamped at claim time, since a single
/// claim can never exceed the buffer's capacity.
#[derive(Debug, Clone, Copy)]
pub struct SequenceBatch {
    size: i64,
    end: i64,
}

impl SequenceBatch {
    pub(crate) fn new(size: i64, end: i64) -> Self {
        Self { size, end }
    }

    /// First sequence of the range.
    pub fn start(&self) -> i64 {
        self.end - self.size + 1
    }

    /// Last sequence of the range.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of sequences in the range.
    pub fn size(&self) -> i64 {
        self.size
    }
}

/// Coordinator for claiming and publishing sequences over a ring buffer.
///
/// The claim strategy `C` fixes the producer model (single, serialized
/// multi, or concurrent multi); the wait strategy `W` fixes how consumers
/// park. Both are type parameters so the hot path monomorphizes with no
/// virtual dispatch.
///
/// One wait strategy instance is shared between the sequencer and every
/// barrier it creates; with the blocking strategy this is what lets a
/// publisher's signal reach parked waiters.
#[derive(Debug)]
pub struct Sequencer<T, C: ClaimStrategy, W: WaitStrategy> {
    ring_buffer: RingBuffer<T>,
    cursor: Arc<Sequence>,
    claim_strategy: C,
    wait_strategy: Arc<W>,
    gating_sequences: RwLock<SequenceGroup>,
}

/// Sequencer for exactly one publisher thread.
pub type SingleProducerSequencer<T, W> = Sequencer<T, SingleProducerClaimStrategy, W>;

/// Sequencer for multiple publishers with publication serialized in claim
/// order.
pub type MultiProducerSequencer<T, W> = Sequencer<T, SerializedMultiProducerClaimStrategy, W>;

/// Sequencer for multiple publishers committing independently through the
/// availability ring.
pub type ConcurrentProducerSequencer<T, W> = Sequencer<T, ConcurrentMultiProducerClaimStrategy, W>;

impl<T, C, W> Sequencer<T, C, W>
where
    C: ClaimStrategy,
    W: WaitStrategy + Default,
{
    /// Create a sequencer with a default-configured wait strategy.
    ///
    /// # Errors
    /// Returns [`DisruptorError::InvalidBufferSize`] unless `buffer_size`
    /// is a positive power of two.
    pub fn new<F>(buffer_size: usize, factory: F) -> Result<Self>
    where
        F: EventFactory<T>,
    {
        Self::with_wait_strategy(buffer_size, factory, W::default())
    }
}

impl<T, C, W> Sequencer<T, C, W>
where
    C: ClaimStrategy,
    W: WaitStrategy,
{
    /// Create a sequencer with an explicitly configured wait strategy.
    ///
    /// # Errors
    /// Returns [`DisruptorError::InvalidBufferSize`] unless `buffer_size`
    /// is a positive power of two.
    pub fn with_wait_strategy<F>(buffer_size: usize, factory: F, wait_strategy: W) -> Result<Self>
    where
        F: EventFactory<T>,
    {
        if !is_power_of_two(buffer_size) {
            return Err(DisruptorError::InvalidBufferSize(buffer_size));
        }

        let sequencer = Self {
            ring_buffer: RingBuffer::new(buffer_size, factory)?,
            cursor: Arc::new(Sequence::default()),
            claim_strategy: C::with_buffer_size(buffer_size),
            wait_strategy: Arc::new(wait_strategy),
            gating_sequences: RwLock::new(SequenceGroup::new()),
        };
        tracing::debug!(buffer_size, "sequencer created");
        Ok(sequencer)
    }

    /// Replace the gating set with `sequences`.
    ///
    /// Gating sequences are the outermost consumers of the dependency
    /// graph; publishers will not claim a slot until every one of them has
    /// moved past its wrap point. Must be called before the first claim.
    pub fn set_gating_sequences(&self, sequences: &[Arc<Sequence>]) {
        *self.gating_sequences.write() = SequenceGroup::from_slice(sequences);
    }

    /// Add sequences to the gating set.
    pub fn add_gating_sequences(&self, sequences: &[Arc<Sequence>]) {
        let mut group = self.gating_sequences.write();
        for sequence in sequences {
            group.add(Arc::clone(sequence));
        }
    }

    /// Remove one sequence from the gating set by identity.
    pub fn remove_gating_sequence(&self, sequence: &Arc<Sequence>) -> bool {
        self.gating_sequences.write().remove(sequence)
    }

    /// Minimum over the gating set, `i64::MAX` when nothing is registered.
    pub fn minimum_gating_sequence(&self) -> i64 {
        self.gating_sequences.read().minimum()
    }

    /// Create a barrier over the cursor and the given upstream dependents.
    ///
    /// An empty dependents list gates purely on the cursor, which is what
    /// first-stage consumers use; later stages pass the sequences of the
    /// consumers they must stay behind.
    pub fn new_barrier(&self, dependents: Vec<Arc<Sequence>>) -> SequenceBarrier<W> {
        SequenceBarrier::new(
            Arc::clone(&self.cursor),
            dependents,
            Arc::clone(&self.wait_strategy),
        )
    }

    /// Current cursor value.
    pub fn cursor(&self) -> i64 {
        self.cursor.get()
    }

    /// Shared handle to the cursor sequence itself.
    pub fn cursor_sequence(&self) -> Arc<Sequence> {
        Arc::clone(&self.cursor)
    }

    /// Number of slots in the ring.
    pub fn buffer_size(&self) -> usize {
        self.ring_buffer.buffer_size()
    }

    /// Whether one more sequence could be claimed right now.
    ///
    /// Concurrent by nature; treat the answer as an indication, not a
    /// reservation.
    pub fn has_available_capacity(&self) -> bool {
        let gating = self.gating_sequences.read();
        self.claim_strategy
            .has_available_capacity(1, &self.cursor, gating.sequences())
    }

    /// Indicative number of free slots.
    pub fn remaining_capacity(&self) -> i64 {
        let consumed = self.minimum_gating_sequence().min(self.cursor.get());
        let produced = self.cursor.get();
        self.ring_buffer.size() - (produced - consumed)
    }

    /// Claim the next `delta` sequences, blocking while downstream
    /// consumers are too far behind, and return the last claimed sequence.
    ///
    /// The payload slots for the range are `claim - delta + 1 ..= claim`.
    ///
    /// # Panics
    /// Panics if `delta` is not in `1 ..= buffer_size`; a single claim
    /// larger than the ring could never be satisfied.
    pub fn claim(&self, delta: i64) -> i64 {
        assert!(
            delta >= 1 && delta <= self.ring_buffer.size(),
            "claim delta {delta} outside 1..={}",
            self.ring_buffer.size()
        );
        let gating = self.gating_sequences.read();
        debug_assert!(
            !gating.is_empty(),
            "gating sequences must be registered before the first claim"
        );
        self.claim_strategy
            .increment_and_get(delta, &self.cursor, gating.sequences())
    }

    /// Claim a batch of up to `size` sequences, clamped to the buffer
    /// size.
    pub fn claim_batch(&self, size: i64) -> SequenceBatch {
        let size = size.clamp(1, self.ring_buffer.size());
        let end = self.claim(size);
        SequenceBatch::new(size, end)
    }

    /// Publish a claimed range ending at `sequence`, making it visible to
    /// consumers.
    ///
    /// Runs the claim strategy's ordering step (which is where the cursor
    /// or the availability flags advance) and then signals any blocked
    /// waiters.
    pub fn publish(&self, sequence: i64, delta: i64) {
        self.claim_strategy
            .synchronize_publishing(sequence, &self.cursor, delta);
        self.wait_strategy.signal_all_when_blocking();
    }

    /// Publish a claimed batch.
    pub fn publish_batch(&self, batch: &SequenceBatch) {
        self.publish(batch.end(), batch.size());
    }

    /// Move the cursor straight to `sequence` and signal waiters.
    ///
    /// Only meaningful with a single publisher, where the cursor is not
    /// shared claim state.
    pub fn force_publish(&self, sequence: i64) {
        self.cursor.set(sequence);
        self.wait_strategy.signal_all_when_blocking();
    }

    /// Clamp `available` to the highest contiguously published sequence at
    /// or after `lower`.
    ///
    /// Consumers call this after every wait when the producer model allows
    /// out-of-order publication; for the other models it is the identity.
    pub fn highest_published(&self, lower: i64, available: i64) -> i64 {
        self.claim_strategy.highest_published(lower, available)
    }

    /// Shared reference to the slot for `sequence`.
    pub fn slot(&self, sequence: i64) -> &T {
        self.ring_buffer.get(sequence)
    }

    /// Raw mutable pointer to the slot for `sequence`.
    ///
    /// # Safety
    /// The caller must hold the unpublished claim on `sequence`; see
    /// [`RingBuffer::get_mut_unchecked`].
    pub unsafe fn slot_mut(&self, sequence: i64) -> *mut T {
        self.ring_buffer.get_mut_unchecked(sequence)
    }

    /// Claim one sequence, populate its slot through `translator`, and
    /// publish it.
    pub fn publish_event<E>(&self, translator: E)
    where
        E: EventTranslator<T>,
    {
        let sequence = self.claim(1);
        // SAFETY: the claim above grants exclusive ownership of the slot
        // until publish.
        unsafe {
            translator.translate_to(&mut *self.slot_mut(sequence), sequence);
        }
        self.publish(sequence, 1);
    }
}
