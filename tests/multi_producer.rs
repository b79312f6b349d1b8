//! Multi-producer scenarios: serialized publication keeping the cursor
//! contiguous, and concurrent publication observed through the
//! availability ring.

use sluice::disruptor::{
    BlockingWaitStrategy, ConcurrentProducerSequencer, DefaultEventFactory,
    MultiProducerSequencer, Sequence, YieldingWaitStrategy,
};
use std::sync::Arc;
use std::thread;

const EVENTS_PER_PRODUCER: i64 = 100;
const PRODUCERS: i64 = 2;

#[test]
fn serialized_producers_keep_cursor_contiguous() {
    let sequencer = Arc::new(
        MultiProducerSequencer::<i64, YieldingWaitStrategy>::new(
            64,
            DefaultEventFactory::<i64>::new(),
        )
        .unwrap(),
    );
    let consumer_sequence = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(&[Arc::clone(&consumer_sequence)]);

    let last_sequence = PRODUCERS * EVENTS_PER_PRODUCER - 1;

    let consumer = {
        let sequencer = Arc::clone(&sequencer);
        let consumer_sequence = Arc::clone(&consumer_sequence);
        thread::spawn(move || {
            let barrier = sequencer.new_barrier(Vec::new());
            let mut next_sequence = 0i64;
            let mut sum = 0i64;
            while next_sequence <= last_sequence {
                let available = barrier.wait_for(next_sequence);
                for sequence in next_sequence..=available {
                    // Contiguous publication: the payload behind the cursor
                    // is always complete.
                    sum += *sequencer.slot(sequence);
                }
                consumer_sequence.set(available);
                next_sequence = available + 1;
            }
            sum
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let sequencer = Arc::clone(&sequencer);
            thread::spawn(move || {
                for _ in 0..EVENTS_PER_PRODUCER {
                    let sequence = sequencer.claim(1);
                    unsafe { *sequencer.slot_mut(sequence) = sequence };
                    sequencer.publish(sequence, 1);
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    let sum = consumer.join().unwrap();

    assert_eq!(sequencer.cursor(), last_sequence);
    assert_eq!(sum, (0..=last_sequence).sum::<i64>());
}

#[test]
fn concurrent_producers_are_observed_exactly_once() {
    let sequencer = Arc::new(
        ConcurrentProducerSequencer::<i64, BlockingWaitStrategy>::new(
            32,
            DefaultEventFactory::<i64>::new(),
        )
        .unwrap(),
    );
    let consumer_sequence = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(&[Arc::clone(&consumer_sequence)]);

    let last_sequence = PRODUCERS * EVENTS_PER_PRODUCER - 1;

    let consumer = {
        let sequencer = Arc::clone(&sequencer);
        let consumer_sequence = Arc::clone(&consumer_sequence);
        thread::spawn(move || {
            let barrier = sequencer.new_barrier(Vec::new());
            let mut seen = vec![0u32; (last_sequence + 1) as usize];
            let mut next_sequence = 0i64;
            while next_sequence <= last_sequence {
                let available = barrier.wait_for(next_sequence);

                // The cursor may cover claims whose payload is not yet
                // written; clamp to the contiguously published prefix.
                let available = sequencer.highest_published(next_sequence, available);
                if available < next_sequence {
                    continue;
                }

                for sequence in next_sequence..=available {
                    // A published slot holds exactly what its claimant
                    // wrote.
                    assert_eq!(*sequencer.slot(sequence), sequence);
                    seen[sequence as usize] += 1;
                }
                consumer_sequence.set(available);
                next_sequence = available + 1;
            }
            seen
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let sequencer = Arc::clone(&sequencer);
            thread::spawn(move || {
                for _ in 0..EVENTS_PER_PRODUCER {
                    let sequence = sequencer.claim(1);
                    unsafe { *sequencer.slot_mut(sequence) = sequence };
                    sequencer.publish(sequence, 1);
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    let seen = consumer.join().unwrap();

    assert!(sequencer.cursor() >= last_sequence);
    assert!(seen.iter().all(|&count| count == 1));
}
