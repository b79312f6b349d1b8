//! `Sluice` - Lock-Free Sequenced Ring Exchange
//!
//! A high-throughput inter-thread message exchange built on a pre-allocated
//! circular buffer whose slots are addressed by monotonically increasing
//! 64-bit sequence numbers. Events flow from one or more publishers to one
//! or more consumers with no allocation on the hot path, no locks in the
//! common case, and coordination that reduces to publishing and observing
//! sequence counters.
//!
//! ## Features
//!
//! - **Lock-free**: coordination through atomic sequence counters and
//!   memory barriers; the only lock on the hot path belongs to the optional
//!   blocking wait strategy
//! - **Zero-allocation**: all event slots are pre-allocated at construction
//! - **Mechanical sympathy**: sequence counters are padded to their own
//!   cache lines to prevent false sharing
//! - **Monomorphized strategies**: claim and wait strategies are selected
//!   through type parameters, so there is no virtual dispatch while
//!   claiming, publishing, or waiting
//! - **Dependency graphs**: consumers can gate on other consumers through
//!   sequence barriers, forming pipelines and diamonds
//!
//! ## Quick Start
//!
//! ```rust
//! use sluice::disruptor::{
//!     BusySpinWaitStrategy, DefaultEventFactory, Sequence, Sequencer,
//!     SingleProducerClaimStrategy,
//! };
//! use std::sync::Arc;
//!
//! // One publisher, busy-spinning consumers, eight pre-allocated slots.
//! let sequencer: Sequencer<i64, SingleProducerClaimStrategy, BusySpinWaitStrategy> =
//!     Sequencer::new(8, DefaultEventFactory::<i64>::new()).unwrap();
//!
//! // Register the consumer's sequence so the publisher cannot lap it.
//! let consumer = Arc::new(Sequence::default());
//! sequencer.set_gating_sequences(&[Arc::clone(&consumer)]);
//!
//! // Publisher side: claim a slot, write the payload, publish.
//! let sequence = sequencer.claim(1);
//! unsafe { *sequencer.slot_mut(sequence) = 42 };
//! sequencer.publish(sequence, 1);
//!
//! // Consumer side: wait on a barrier over the cursor, then read.
//! let barrier = sequencer.new_barrier(Vec::new());
//! let available = barrier.wait_for(sequence);
//! assert_eq!(available, sequence);
//! assert_eq!(*sequencer.slot(sequence), 42);
//! consumer.set(available);
//! ```
//!
//! ## Architecture
//!
//! - [`disruptor::Sequence`]: cache-line padded atomic sequence counter
//! - [`disruptor::RingBuffer`]: pre-allocated power-of-two slot storage
//! - [`disruptor::ClaimStrategy`]: allocates sequence ranges to publishers
//!   and prevents buffer wrap
//! - [`disruptor::WaitStrategy`]: parks a consumer until a sequence becomes
//!   available
//! - [`disruptor::SequenceBarrier`]: consumer-facing gate over the cursor
//!   and upstream dependents, with cooperative alerting
//! - [`disruptor::Sequencer`]: composes all of the above behind the
//!   claim/publish/barrier surface
//!
//! Consumer-side failures are signalled with sentinel sequence values
//! rather than errors: [`disruptor::ALERTED_SIGNAL`] and
//! [`disruptor::TIMEOUT_SIGNAL`]. Publisher-side operations never fail on
//! the hot path; they block until downstream consumers free capacity.

pub mod disruptor;

pub use disruptor::{
    is_power_of_two, BatchEventProcessor, BlockingWaitStrategy, BusySpinWaitStrategy,
    ClaimStrategy, ClosureEventFactory, ConcurrentMultiProducerClaimStrategy,
    DefaultEventFactory, DisruptorError,
    EventFactory, EventHandler, EventProcessor, EventTranslator, NoOpEventProcessor,
    ProcessorHandle, Result, RingBuffer, Sequence, SequenceBarrier, SequenceBatch, SequenceGroup,
    Sequencer,
    SerializedMultiProducerClaimStrategy, SingleProducerClaimStrategy, SleepingWaitStrategy,
    ThreadContext, WaitStrategy, YieldingWaitStrategy, ALERTED_SIGNAL, FIRST_SEQUENCE_VALUE,
    INITIAL_CURSOR_VALUE, TIMEOUT_SIGNAL,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
