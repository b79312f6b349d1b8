//! Single-producer scenarios: straight-line consumption, wrap-around slot
//! reuse, and backpressure against a lagging consumer.

use sluice::disruptor::{
    BusySpinWaitStrategy, ClosureEventFactory, DefaultEventFactory, Sequence,
    SingleProducerSequencer, YieldingWaitStrategy,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Default)]
struct CounterEvent {
    value: i64,
}

#[test]
fn spsc_consumer_sees_every_event() {
    let sequencer = Arc::new(
        SingleProducerSequencer::<CounterEvent, BusySpinWaitStrategy>::new(
            8,
            DefaultEventFactory::<CounterEvent>::new(),
        )
        .unwrap(),
    );
    let consumer_sequence = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(&[Arc::clone(&consumer_sequence)]);

    let consumer = {
        let sequencer = Arc::clone(&sequencer);
        let consumer_sequence = Arc::clone(&consumer_sequence);
        thread::spawn(move || {
            let barrier = sequencer.new_barrier(Vec::new());
            let mut sum = 0i64;
            let mut next_sequence = consumer_sequence.get() + 1;
            while next_sequence <= 63 {
                let available = barrier.wait_for(next_sequence);
                for sequence in next_sequence..=available {
                    sum += sequencer.slot(sequence).value;
                }
                consumer_sequence.set(available);
                next_sequence = available + 1;
            }
            sum
        })
    };

    for value in 0..=63i64 {
        let sequence = sequencer.claim(1);
        unsafe { (*sequencer.slot_mut(sequence)).value = value };
        sequencer.publish(sequence, 1);
    }

    let sum = consumer.join().unwrap();
    assert_eq!(sum, 2016);
    assert_eq!(sequencer.cursor(), 63);
    assert_eq!(consumer_sequence.get(), 63);
}

#[test]
fn wrap_around_reuses_each_slot_once_per_lap() {
    let sequencer = Arc::new(
        SingleProducerSequencer::<CounterEvent, BusySpinWaitStrategy>::new(
            8,
            DefaultEventFactory::<CounterEvent>::new(),
        )
        .unwrap(),
    );
    let consumer_sequence = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(&[Arc::clone(&consumer_sequence)]);

    let consumer = {
        let sequencer = Arc::clone(&sequencer);
        let consumer_sequence = Arc::clone(&consumer_sequence);
        thread::spawn(move || {
            let barrier = sequencer.new_barrier(Vec::new());
            let mut slot_use_counts = [0u32; 8];
            let mut next_sequence = 0i64;
            while next_sequence <= 63 {
                let available = barrier.wait_for(next_sequence);
                for sequence in next_sequence..=available {
                    // The slot content is exactly what the publisher wrote
                    // for this sequence, even though the physical slot has
                    // been overwritten on every lap.
                    assert_eq!(sequencer.slot(sequence).value, sequence);
                    slot_use_counts[(sequence & 7) as usize] += 1;
                }
                consumer_sequence.set(available);
                next_sequence = available + 1;
            }
            slot_use_counts
        })
    };

    for sequence_value in 0..=63i64 {
        let sequence = sequencer.claim(1);
        assert_eq!(sequence, sequence_value);
        unsafe { (*sequencer.slot_mut(sequence)).value = sequence };
        sequencer.publish(sequence, 1);
    }

    let slot_use_counts = consumer.join().unwrap();
    assert_eq!(slot_use_counts, [8u32; 8]);
}

#[test]
fn backpressure_blocks_publisher_until_consumer_advances() {
    let sequencer = Arc::new(
        SingleProducerSequencer::<CounterEvent, YieldingWaitStrategy>::new(
            8,
            DefaultEventFactory::<CounterEvent>::new(),
        )
        .unwrap(),
    );
    let consumer_sequence = Arc::new(Sequence::default());
    sequencer.set_gating_sequences(&[Arc::clone(&consumer_sequence)]);

    // Fill the ring while the consumer sits at -1.
    for _ in 0..8 {
        let sequence = sequencer.claim(1);
        sequencer.publish(sequence, 1);
    }
    assert_eq!(sequencer.cursor(), 7);
    assert!(!sequencer.has_available_capacity());

    // The ninth claim must park until the consumer frees a slot.
    let claim_started = Arc::new(AtomicBool::new(false));
    let blocked_publisher = {
        let sequencer = Arc::clone(&sequencer);
        let claim_started = Arc::clone(&claim_started);
        thread::spawn(move || {
            claim_started.store(true, Ordering::Release);
            let sequence = sequencer.claim(1);
            sequencer.publish(sequence, 1);
            sequence
        })
    };

    while !claim_started.load(Ordering::Acquire) {
        thread::yield_now();
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(sequencer.cursor(), 7, "publisher must not outrun the consumer");

    consumer_sequence.set(0);
    assert_eq!(blocked_publisher.join().unwrap(), 8);
    assert_eq!(sequencer.cursor(), 8);

    // The freed slot was consumed by the ninth claim; capacity reappears
    // only when the consumer moves again.
    assert!(!sequencer.has_available_capacity());
    consumer_sequence.set(1);
    assert!(sequencer.has_available_capacity());
}

#[test]
fn barrier_over_empty_dependents_returns_published_sequence() {
    let sequencer = SingleProducerSequencer::<CounterEvent, BusySpinWaitStrategy>::new(
        16,
        ClosureEventFactory::new(|| CounterEvent { value: -1 }),
    )
    .unwrap();
    let consumer_sequence = Arc::new(Sequence::new(15));
    sequencer.set_gating_sequences(&[consumer_sequence]);

    let barrier = sequencer.new_barrier(Vec::new());
    for k in 0..=9i64 {
        let sequence = sequencer.claim(1);
        sequencer.publish(sequence, 1);
        assert_eq!(barrier.wait_for(k), k);
    }
}
