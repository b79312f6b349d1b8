//! Sequence barrier
//!
//! The consumer-facing gate: a barrier wraps the sequencer's cursor, the
//! upstream sequences this consumer depends on, and an alert flag for
//! cooperative shutdown. Waiting delegates to the wait strategy instance
//! shared with the sequencer, so a blocking publisher signal and a blocked
//! waiter always meet on the same condition variable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::disruptor::{Sequence, WaitStrategy};

/// Gate over the cursor and a list of upstream dependent sequences.
///
/// With an empty dependents list the barrier gates purely on the cursor
/// (a first-stage consumer); otherwise the minimum over the dependents
/// bounds what [`SequenceBarrier::wait_for`] may return, which is how
/// dependency ordering between consumers is enforced.
#[derive(Debug)]
pub struct SequenceBarrier<W: WaitStrategy> {
    cursor: Arc<Sequence>,
    dependents: Vec<Arc<Sequence>>,
    wait_strategy: Arc<W>,
    alerted: AtomicBool,
}

impl<W: WaitStrategy> SequenceBarrier<W> {
    /// Create a barrier over `cursor` and `dependents`, waiting through
    /// `wait_strategy`.
    pub fn new(
        cursor: Arc<Sequence>,
        dependents: Vec<Arc<Sequence>>,
        wait_strategy: Arc<W>,
    ) -> Self {
        Self {
            cursor,
            dependents,
            wait_strategy,
            alerted: AtomicBool::new(false),
        }
    }

    /// Wait until `sequence` is available and return the greatest
    /// available sequence, or [`crate::disruptor::ALERTED_SIGNAL`] if the
    /// barrier was alerted.
    pub fn wait_for(&self, sequence: i64) -> i64 {
        self.wait_strategy
            .wait_for(sequence, &self.cursor, &self.dependents, &self.alerted)
    }

    /// Like [`SequenceBarrier::wait_for`] with a deadline, returning
    /// [`crate::disruptor::TIMEOUT_SIGNAL`] when it elapses first.
    pub fn wait_for_timeout(&self, sequence: i64, timeout: Duration) -> i64 {
        self.wait_strategy.wait_for_timeout(
            sequence,
            &self.cursor,
            &self.dependents,
            &self.alerted,
            timeout,
        )
    }

    /// Current cursor value.
    pub fn cursor_value(&self) -> i64 {
        self.cursor.get()
    }

    /// Whether the barrier is alerted.
    pub fn alerted(&self) -> bool {
        self.alerted.load(Ordering::Acquire)
    }

    /// Set or clear the alert flag.
    ///
    /// Raising the alert also wakes blocked waiters, so a consumer parked
    /// in a blocking wait observes the flag promptly.
    pub fn set_alerted(&self, alert: bool) {
        self.alerted.store(alert, Ordering::Release);
        if alert {
            self.wait_strategy.signal_all_when_blocking();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disruptor::{BusySpinWaitStrategy, ALERTED_SIGNAL, TIMEOUT_SIGNAL};

    fn barrier_with_cursor_at(
        value: i64,
        dependents: Vec<Arc<Sequence>>,
    ) -> SequenceBarrier<BusySpinWaitStrategy> {
        SequenceBarrier::new(
            Arc::new(Sequence::new(value)),
            dependents,
            Arc::new(BusySpinWaitStrategy::new()),
        )
    }

    #[test]
    fn test_wait_for_published_sequence() {
        let barrier = barrier_with_cursor_at(5, Vec::new());
        assert_eq!(barrier.wait_for(3), 5);
        assert_eq!(barrier.wait_for(5), 5);
        assert_eq!(barrier.cursor_value(), 5);
    }

    #[test]
    fn test_dependents_bound_wait_for() {
        let upstream = Arc::new(Sequence::new(2));
        let barrier = barrier_with_cursor_at(5, vec![Arc::clone(&upstream)]);

        assert_eq!(barrier.wait_for(1), 2);

        upstream.set(4);
        assert_eq!(barrier.wait_for(3), 4);
    }

    #[test]
    fn test_alert_overrides_available_cursor() {
        let barrier = barrier_with_cursor_at(10, Vec::new());
        assert!(!barrier.alerted());

        barrier.set_alerted(true);
        assert!(barrier.alerted());
        assert_eq!(barrier.wait_for(0), ALERTED_SIGNAL);

        barrier.set_alerted(false);
        assert_eq!(barrier.wait_for(0), 10);
    }

    #[test]
    fn test_timeout_propagates() {
        let barrier = barrier_with_cursor_at(-1, Vec::new());
        let signal = barrier.wait_for_timeout(0, Duration::from_millis(5));
        assert_eq!(signal, TIMEOUT_SIGNAL);
    }
}
