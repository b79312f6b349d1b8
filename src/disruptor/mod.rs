//! Sluice core: sequenced ring-buffer coordination
//!
//! This module contains the coordination layer of the exchange: the padded
//! sequence counters, the claim strategies (who may write where), the wait
//! strategies (how a consumer parks), the sequence barrier (the consumer
//! gate), and the sequencer that composes them with the ring storage.

pub mod claim_strategy;
pub mod event_factory;
pub mod event_processor;
pub mod event_translator;
pub mod ring_buffer;
pub mod sequence;
pub mod sequence_barrier;
pub mod sequencer;
pub mod thread_management;
pub mod wait_strategy;


pub use claim_strategy::{
    ClaimStrategy, ConcurrentMultiProducerClaimStrategy, SerializedMultiProducerClaimStrategy,
    SingleProducerClaimStrategy,
};
pub use event_factory::{ClosureEventFactory, DefaultEventFactory, EventFactory};
pub use event_processor::{
    BatchEventProcessor, EventHandler, EventProcessor, NoOpEventProcessor, ProcessorHandle,
};
pub use event_translator::EventTranslator;
pub use ring_buffer::RingBuffer;
pub use sequence::{get_minimum_sequence, Sequence, SequenceGroup};
pub use sequence_barrier::SequenceBarrier;
pub use sequencer::{
    ConcurrentProducerSequencer, MultiProducerSequencer, SequenceBatch, Sequencer,
    SingleProducerSequencer,
};
pub use thread_management::ThreadContext;
pub use wait_strategy::{
    BlockingWaitStrategy, BusySpinWaitStrategy, SleepingWaitStrategy, WaitStrategy,
    YieldingWaitStrategy,
};

/// The value a sequence counter holds before anything has been published.
pub const INITIAL_CURSOR_VALUE: i64 = -1;

/// The first sequence number a publisher can claim.
pub const FIRST_SEQUENCE_VALUE: i64 = 0;

/// Sentinel returned by `wait_for` when the barrier was alerted.
///
/// Alerting is the cooperative cancellation mechanism: a consumer that
/// receives this value should leave its processing loop.
pub const ALERTED_SIGNAL: i64 = -2;

/// Sentinel returned by `wait_for` when the timeout elapsed before the
/// requested sequence became available. Timing out clears no state; the
/// caller may simply retry.
pub const TIMEOUT_SIGNAL: i64 = -3;

/// Errors reported at construction time.
///
/// The hot path never reports errors: publishers block until capacity frees
/// up, and consumers receive sentinel sequence values. Everything that can
/// actually fail is a configuration problem caught while building.
#[derive(Debug, thiserror::Error)]
pub enum DisruptorError {
    #[error("buffer size must be a positive power of 2, got: {0}")]
    InvalidBufferSize(usize),
}

pub type Result<T> = std::result::Result<T, DisruptorError>;

/// Check whether a buffer size is a positive power of two.
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}
