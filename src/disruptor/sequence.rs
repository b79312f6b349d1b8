//! Sequence counters
//!
//! A `Sequence` tracks progress through the ring buffer and is the only
//! thing producers and consumers share. It provides atomic operations while
//! occupying a full cache line so that independent counters never contend
//! on the same line.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::disruptor::INITIAL_CURSOR_VALUE;

/// Cache line size the padding is computed against.
const CACHE_LINE_SIZE: usize = 64;

/// A cache-line padded, monotonically advancing sequence counter.
///
/// The alignment attribute plus the trailing padding give every instance
/// exclusive ownership of its cache line, on both sides of the atomic word.
/// Two sequences updated from different threads therefore never invalidate
/// each other's lines. This padding is load-bearing: adjacent unpadded
/// counters cost a multiple of the padded throughput under contention.
#[repr(align(64))]
pub struct Sequence {
    value: AtomicI64,
    _padding: [u8; CACHE_LINE_SIZE - std::mem::size_of::<AtomicI64>()],
}

impl Sequence {
    /// Create a new sequence with the given initial value.
    pub fn new(initial_value: i64) -> Self {
        Self {
            value: AtomicI64::new(initial_value),
            _padding: [0; CACHE_LINE_SIZE - std::mem::size_of::<AtomicI64>()],
        }
    }

    /// Get the current value with acquire semantics.
    ///
    /// A reader that observes a value `s` also observes every write the
    /// publisher made before releasing `s`.
    #[inline]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Set the value with release semantics.
    #[inline]
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Release);
    }

    /// Atomically add `increment` and return the new value.
    #[inline]
    pub fn add_and_get(&self, increment: i64) -> i64 {
        self.value.fetch_add(increment, Ordering::AcqRel) + increment
    }

    /// Compare-and-set the value, returning whether the exchange happened.
    #[inline]
    pub fn compare_and_set(&self, expected: i64, new: i64) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(INITIAL_CURSOR_VALUE)
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence").field("value", &self.get()).finish()
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Minimum over a set of sequence references.
///
/// Returns `i64::MAX` when the slice is empty, which reads as "nothing
/// gates here".
pub fn get_minimum_sequence(sequences: &[Arc<Sequence>]) -> i64 {
    sequences
        .iter()
        .map(|sequence| sequence.get())
        .min()
        .unwrap_or(i64::MAX)
}

/// A set of sequences tracked together, used for the sequencer's gating set.
#[derive(Debug, Default)]
pub struct SequenceGroup {
    sequences: Vec<Arc<Sequence>>,
}

impl SequenceGroup {
    /// Create a new empty sequence group.
    pub fn new() -> Self {
        Self { sequences: Vec::new() }
    }

    /// Create a group holding the given sequences.
    pub fn from_slice(sequences: &[Arc<Sequence>]) -> Self {
        Self { sequences: sequences.to_vec() }
    }

    /// Add a sequence to the group.
    pub fn add(&mut self, sequence: Arc<Sequence>) {
        self.sequences.push(sequence);
    }

    /// Remove a sequence from the group by identity.
    pub fn remove(&mut self, sequence: &Arc<Sequence>) -> bool {
        if let Some(pos) = self.sequences.iter().position(|s| Arc::ptr_eq(s, sequence)) {
            self.sequences.remove(pos);
            true
        } else {
            false
        }
    }

    /// Minimum value across the group, `i64::MAX` when empty.
    pub fn minimum(&self) -> i64 {
        get_minimum_sequence(&self.sequences)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// All sequences in the group.
    pub fn sequences(&self) -> &[Arc<Sequence>] {
        &self.sequences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_sequence_creation() {
        let sequence = Sequence::new(42);
        assert_eq!(sequence.get(), 42);
    }

    #[test]
    fn test_sequence_default_is_initial_cursor() {
        let sequence = Sequence::default();
        assert_eq!(sequence.get(), INITIAL_CURSOR_VALUE);
    }

    #[test]
    fn test_sequence_set_get() {
        let sequence = Sequence::new(0);
        sequence.set(100);
        assert_eq!(sequence.get(), 100);
    }

    #[test]
    fn test_sequence_add_and_get() {
        let sequence = Sequence::new(10);
        assert_eq!(sequence.add_and_get(5), 15);
        assert_eq!(sequence.get(), 15);
    }

    #[test]
    fn test_sequence_compare_and_set() {
        let sequence = Sequence::new(10);

        assert!(sequence.compare_and_set(10, 20));
        assert_eq!(sequence.get(), 20);

        assert!(!sequence.compare_and_set(10, 30));
        assert_eq!(sequence.get(), 20);
    }

    #[test]
    fn test_sequence_occupies_a_full_cache_line() {
        assert!(std::mem::size_of::<Sequence>() >= 64);
        assert!(std::mem::align_of::<Sequence>() >= 64);
    }

    #[test]
    fn test_get_minimum_sequence() {
        let sequences = vec![
            Arc::new(Sequence::new(10)),
            Arc::new(Sequence::new(3)),
            Arc::new(Sequence::new(7)),
        ];
        assert_eq!(get_minimum_sequence(&sequences), 3);
        assert_eq!(get_minimum_sequence(&[]), i64::MAX);
    }

    #[test]
    fn test_sequence_group() {
        let mut group = SequenceGroup::new();
        assert!(group.is_empty());

        let a = Arc::new(Sequence::new(10));
        let b = Arc::new(Sequence::new(20));
        let c = Arc::new(Sequence::new(5));

        group.add(Arc::clone(&a));
        group.add(Arc::clone(&b));
        group.add(Arc::clone(&c));

        assert_eq!(group.len(), 3);
        assert_eq!(group.minimum(), 5);

        assert!(group.remove(&c));
        assert_eq!(group.len(), 2);
        assert_eq!(group.minimum(), 10);

        assert!(!group.remove(&c));
    }

    #[test]
    fn test_sequence_concurrent_increments() {
        let sequence = Arc::new(Sequence::new(0));
        let mut handles = vec![];

        for _ in 0..10 {
            let sequence = Arc::clone(&sequence);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    sequence.add_and_get(1);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sequence.get(), 10_000);
    }
}
