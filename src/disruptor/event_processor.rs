//! Event processors
//!
//! Scaffolding for the consumer side: a handler contract, a batch
//! processor that drives the canonical wait/process loop on the current
//! thread, and a no-op processor whose sequence mirrors the cursor for
//! gating without work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::disruptor::{
    ClaimStrategy, Sequence, SequenceBarrier, Sequencer, WaitStrategy, ALERTED_SIGNAL,
    TIMEOUT_SIGNAL,
};

/// Callback for events observed by a [`BatchEventProcessor`].
pub trait EventHandler<T>: Send {
    /// Called once per available event, in sequence order.
    /// `end_of_batch` marks the last event of the currently available run.
    fn on_event(&mut self, event: &T, sequence: i64, end_of_batch: bool);
}

/// Every `FnMut(&T, i64, bool)` closure is a handler.
impl<T, F> EventHandler<T> for F
where
    F: FnMut(&T, i64, bool) + Send,
{
    fn on_event(&mut self, event: &T, sequence: i64, end_of_batch: bool) {
        self(event, sequence, end_of_batch)
    }
}

/// A runnable consumer with a published sequence.
pub trait EventProcessor {
    /// The sequence this processor publishes its progress through; register
    /// it as a gating or dependent sequence.
    fn sequence(&self) -> Arc<Sequence>;

    /// Drive the processor on the current thread until halted.
    fn run(self);
}

/// Shared halt control for a running [`BatchEventProcessor`].
#[derive(Clone)]
pub struct ProcessorHandle {
    running: Arc<AtomicBool>,
    alert: Arc<dyn Fn() + Send + Sync>,
}

impl ProcessorHandle {
    /// Ask the processor to stop and wake it if it is parked.
    pub fn halt(&self) {
        self.running.store(false, Ordering::Release);
        (self.alert)();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Consumer loop: wait on a barrier, process every available event,
/// publish progress, repeat; leave the loop when halted.
///
/// The processor clamps each wait result through the sequencer's
/// `highest_published`, so it is safe with every producer model including
/// out-of-order publication.
pub struct BatchEventProcessor<T, C, W, H>
where
    C: ClaimStrategy,
    W: WaitStrategy,
    H: EventHandler<T>,
{
    sequencer: Arc<Sequencer<T, C, W>>,
    barrier: Arc<SequenceBarrier<W>>,
    sequence: Arc<Sequence>,
    running: Arc<AtomicBool>,
    handler: H,
}

impl<T, C, W, H> BatchEventProcessor<T, C, W, H>
where
    C: ClaimStrategy,
    W: WaitStrategy,
    H: EventHandler<T>,
{
    /// Create a processor over `barrier`, feeding events to `handler`.
    pub fn new(
        sequencer: Arc<Sequencer<T, C, W>>,
        barrier: SequenceBarrier<W>,
        handler: H,
    ) -> Self {
        Self {
            sequencer,
            barrier: Arc::new(barrier),
            sequence: Arc::new(Sequence::default()),
            running: Arc::new(AtomicBool::new(true)),
            handler,
        }
    }

    /// Handle for halting the processor from another thread.
    pub fn handle(&self) -> ProcessorHandle {
        let barrier = Arc::clone(&self.barrier);
        ProcessorHandle {
            running: Arc::clone(&self.running),
            alert: Arc::new(move || barrier.set_alerted(true)),
        }
    }
}

impl<T, C, W, H> EventProcessor for BatchEventProcessor<T, C, W, H>
where
    C: ClaimStrategy,
    W: WaitStrategy,
    H: EventHandler<T>,
{
    fn sequence(&self) -> Arc<Sequence> {
        Arc::clone(&self.sequence)
    }

    fn run(mut self) {
        tracing::debug!("event processor started");
        let mut next_sequence = self.sequence.get() + 1;

        loop {
            let available = self.barrier.wait_for(next_sequence);

            if available == ALERTED_SIGNAL {
                if !self.running.load(Ordering::Acquire) {
                    break;
                }
                continue;
            }
            if available == TIMEOUT_SIGNAL {
                continue;
            }

            let available = self.sequencer.highest_published(next_sequence, available);
            if available < next_sequence {
                continue;
            }

            for sequence in next_sequence..=available {
                let event = self.sequencer.slot(sequence);
                self.handler.on_event(event, sequence, sequence == available);
            }

            self.sequence.set(available);
            next_sequence = available + 1;
        }

        tracing::debug!(sequence = self.sequence.get(), "event processor halted");
    }
}

/// Processor that does no work: its sequence is the cursor itself.
///
/// Registering it as a gating sequence makes publishers run ungated, which
/// is what throughput tests and publisher-only setups want.
pub struct NoOpEventProcessor {
    sequence: Arc<Sequence>,
}

impl NoOpEventProcessor {
    /// Create a no-op processor mirroring the sequencer's cursor.
    pub fn new<T, C, W>(sequencer: &Sequencer<T, C, W>) -> Self
    where
        C: ClaimStrategy,
        W: WaitStrategy,
    {
        Self {
            sequence: sequencer.cursor_sequence(),
        }
    }
}

impl EventProcessor for NoOpEventProcessor {
    fn sequence(&self) -> Arc<Sequence> {
        Arc::clone(&self.sequence)
    }

    fn run(self) {}
}
