//! Wait strategies
//!
//! A wait strategy decides how a consumer parks while the sequence it wants
//! is not yet available. The four variants trade latency against CPU: busy
//! spinning saturates a core for the lowest latency, yielding and sleeping
//! back off progressively, and blocking hands the problem to the OS with a
//! mutex and condition variable.
//!
//! All variants share one return convention: the greatest available
//! sequence at or above the requested one on success, [`ALERTED_SIGNAL`]
//! when the barrier's alert flag was observed, and [`TIMEOUT_SIGNAL`] when
//! the deadline of the timed variant passed first.

use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::disruptor::sequence::get_minimum_sequence;
use crate::disruptor::{Sequence, ALERTED_SIGNAL, TIMEOUT_SIGNAL};

/// Strategy for waiting until a target sequence becomes available.
///
/// The available value is the cursor when `dependents` is empty, and the
/// minimum over `dependents` otherwise: a consumer behind other consumers
/// must not observe sequences its upstream has not finished with.
///
/// Implementations poll the alert flag on every iteration of their wait
/// loop, and an alerted barrier wins even when the target sequence is
/// already available.
pub trait WaitStrategy: Send + Sync + 'static {
    /// Wait until the available sequence reaches `sequence`.
    ///
    /// Returns the available sequence (which may be higher than requested),
    /// or [`ALERTED_SIGNAL`] if the alert flag was observed.
    fn wait_for(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
    ) -> i64;

    /// Like [`WaitStrategy::wait_for`], giving up once `timeout` has
    /// elapsed from entry.
    ///
    /// Returns [`TIMEOUT_SIGNAL`] when the deadline passes first. Timing
    /// out clears nothing; the caller may retry.
    fn wait_for_timeout(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        timeout: Duration,
    ) -> i64;

    /// Wake all blocked waiters.
    ///
    /// Publishers call this after every publish. Only the blocking strategy
    /// has anyone to wake; everywhere else this is a no-op.
    fn signal_all_when_blocking(&self) {}
}

/// The sequence consumers may advance to right now.
#[inline]
fn min_available(cursor: &Sequence, dependents: &[Arc<Sequence>]) -> i64 {
    if dependents.is_empty() {
        cursor.get()
    } else {
        get_minimum_sequence(dependents)
    }
}

/// Shared wait loop for the spinning strategies; `backoff` is invoked once
/// per unfruitful iteration.
#[inline]
fn spin_wait(
    sequence: i64,
    cursor: &Sequence,
    dependents: &[Arc<Sequence>],
    alerted: &AtomicBool,
    deadline: Option<Instant>,
    mut backoff: impl FnMut(),
) -> i64 {
    loop {
        if alerted.load(Ordering::Acquire) {
            return ALERTED_SIGNAL;
        }
        let available = min_available(cursor, dependents);
        if available >= sequence {
            return available;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return TIMEOUT_SIGNAL;
            }
        }
        backoff();
    }
}

/// Busy-spin wait strategy.
///
/// Tight polling loop with a pause hint each iteration. Lowest and most
/// consistent latency, at the price of a saturated core; pair it with CPU
/// pinning (see [`crate::disruptor::ThreadContext`]).
#[derive(Debug, Default)]
pub struct BusySpinWaitStrategy;

impl BusySpinWaitStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl WaitStrategy for BusySpinWaitStrategy {
    fn wait_for(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
    ) -> i64 {
        spin_wait(sequence, cursor, dependents, alerted, None, hint::spin_loop)
    }

    fn wait_for_timeout(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        timeout: Duration,
    ) -> i64 {
        let deadline = Instant::now() + timeout;
        spin_wait(sequence, cursor, dependents, alerted, Some(deadline), hint::spin_loop)
    }
}

/// Yielding wait strategy.
///
/// Spins a bounded number of iterations, then yields the thread on every
/// iteration after that. A good compromise when cores are not dedicated.
#[derive(Debug)]
pub struct YieldingWaitStrategy {
    spin_tries: u32,
}

impl YieldingWaitStrategy {
    pub fn new() -> Self {
        Self { spin_tries: 200 }
    }

    /// Override the number of spin iterations before yielding starts.
    pub fn with_spin_tries(spin_tries: u32) -> Self {
        Self { spin_tries }
    }
}

impl Default for YieldingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for YieldingWaitStrategy {
    fn wait_for(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
    ) -> i64 {
        let mut counter = self.spin_tries;
        spin_wait(sequence, cursor, dependents, alerted, None, || {
            if counter > 0 {
                counter -= 1;
                hint::spin_loop();
            } else {
                thread::yield_now();
            }
        })
    }

    fn wait_for_timeout(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        timeout: Duration,
    ) -> i64 {
        let deadline = Instant::now() + timeout;
        let mut counter = self.spin_tries;
        spin_wait(sequence, cursor, dependents, alerted, Some(deadline), || {
            if counter > 0 {
                counter -= 1;
                hint::spin_loop();
            } else {
                thread::yield_now();
            }
        })
    }
}

/// Sleeping wait strategy.
///
/// Three-phase back-off: spin for the first half of the retry budget,
/// yield for the second half, then sleep per iteration. Latency becomes as
/// coarse as the sleep duration, but an idle consumer costs almost nothing.
#[derive(Debug)]
pub struct SleepingWaitStrategy {
    retries: u32,
    sleep_duration: Duration,
}

impl SleepingWaitStrategy {
    pub fn new() -> Self {
        Self {
            retries: 200,
            sleep_duration: Duration::from_millis(1),
        }
    }

    /// Override the retry budget and the per-iteration sleep.
    pub fn with_parameters(retries: u32, sleep_duration: Duration) -> Self {
        Self { retries, sleep_duration }
    }
}

impl Default for SleepingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for SleepingWaitStrategy {
    fn wait_for(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
    ) -> i64 {
        let mut counter = self.retries;
        let half = self.retries / 2;
        spin_wait(sequence, cursor, dependents, alerted, None, || {
            if counter > half {
                counter -= 1;
                hint::spin_loop();
            } else if counter > 0 {
                counter -= 1;
                thread::yield_now();
            } else {
                thread::sleep(self.sleep_duration);
            }
        })
    }

    fn wait_for_timeout(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        timeout: Duration,
    ) -> i64 {
        let deadline = Instant::now() + timeout;
        let mut counter = self.retries;
        let half = self.retries / 2;
        spin_wait(sequence, cursor, dependents, alerted, Some(deadline), || {
            if counter > half {
                counter -= 1;
                hint::spin_loop();
            } else if counter > 0 {
                counter -= 1;
                thread::yield_now();
            } else {
                thread::sleep(self.sleep_duration);
            }
        })
    }
}

/// Blocking wait strategy.
///
/// Waiters block on a condition variable while the cursor is short of the
/// target; once the cursor has caught up they spin on the dependents'
/// minimum, which only ever trails the cursor briefly. This is the only
/// strategy whose `signal_all_when_blocking` does real work, so publishers
/// must call it after publishing (the sequencer does).
#[derive(Debug, Default)]
pub struct BlockingWaitStrategy {
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl BlockingWaitStrategy {
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }
}

impl WaitStrategy for BlockingWaitStrategy {
    fn wait_for(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
    ) -> i64 {
        if alerted.load(Ordering::Acquire) {
            return ALERTED_SIGNAL;
        }

        let mut available = cursor.get();
        if available < sequence {
            let mut guard = self.mutex.lock();
            loop {
                if alerted.load(Ordering::Acquire) {
                    return ALERTED_SIGNAL;
                }
                available = cursor.get();
                if available >= sequence {
                    break;
                }
                self.condvar.wait(&mut guard);
            }
        }

        if !dependents.is_empty() {
            loop {
                if alerted.load(Ordering::Acquire) {
                    return ALERTED_SIGNAL;
                }
                available = get_minimum_sequence(dependents);
                if available >= sequence {
                    break;
                }
                hint::spin_loop();
            }
        }

        available
    }

    fn wait_for_timeout(
        &self,
        sequence: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        timeout: Duration,
    ) -> i64 {
        let deadline = Instant::now() + timeout;

        if alerted.load(Ordering::Acquire) {
            return ALERTED_SIGNAL;
        }

        let mut available = cursor.get();
        if available < sequence {
            let mut guard = self.mutex.lock();
            loop {
                if alerted.load(Ordering::Acquire) {
                    return ALERTED_SIGNAL;
                }
                available = cursor.get();
                if available >= sequence {
                    break;
                }
                if self.condvar.wait_until(&mut guard, deadline).timed_out() {
                    // Last observation before giving up; a publish may have
                    // raced the deadline.
                    available = cursor.get();
                    if available < sequence {
                        return TIMEOUT_SIGNAL;
                    }
                    break;
                }
            }
        }

        if !dependents.is_empty() {
            loop {
                if alerted.load(Ordering::Acquire) {
                    return ALERTED_SIGNAL;
                }
                available = get_minimum_sequence(dependents);
                if available >= sequence {
                    break;
                }
                if Instant::now() >= deadline {
                    return TIMEOUT_SIGNAL;
                }
                hint::spin_loop();
            }
        }

        available
    }

    fn signal_all_when_blocking(&self) {
        // The lock is taken before notifying so a signal cannot slip in
        // between a waiter's predicate check and its wait.
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }
}
