//! Processor thread hosting
//!
//! Consumers run on plain OS threads. `ThreadContext` names those threads
//! and can pin them to a core, which the busy-spin wait strategy wants:
//! a spinning consumer that migrates between cores pays for every move
//! with cold caches and latency jitter.

use std::thread::{self, JoinHandle};

use core_affinity::CoreId;

use crate::disruptor::EventProcessor;

/// Configuration for a processor thread.
#[derive(Debug, Clone, Default)]
pub struct ThreadContext {
    name: Option<String>,
    affinity: Option<CoreId>,
}

impl ThreadContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the thread.
    pub fn thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Pin the thread to a CPU core.
    ///
    /// Pinning is best-effort: an unavailable core is reported with a
    /// warning and the thread runs unpinned.
    pub fn pin_at_core(mut self, core_id: usize) -> Self {
        self.affinity = Some(CoreId { id: core_id });
        self
    }

    /// Spawn a thread driving `processor` until it halts.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the OS refuses to create the
    /// thread.
    pub fn spawn<P>(self, processor: P) -> std::io::Result<JoinHandle<()>>
    where
        P: EventProcessor + Send + 'static,
    {
        let name = self.name.unwrap_or_else(|| "sluice-processor".to_string());
        let affinity = self.affinity;

        thread::Builder::new().name(name).spawn(move || {
            if let Some(core) = affinity {
                if !core_affinity::set_for_current(core) {
                    tracing::warn!(core = core.id, "failed to pin processor thread");
                }
            }
            processor.run();
        })
    }
}
