// ─────────────────────────────────────────────────────────────────────
// Scalaron — Run Event Sink
// ─────────────────────────────────────────────────────────────────────
//! Where the driver reports progress and failures.
//!
//! The driver never writes to stdout. It hands human-readable messages
//! to an [`EventSink`]; the default forwards to the `log` facade under
//! target `scalaron`, so any `log` backend picks them up.

use parking_lot::Mutex;

/// Trait for progress/error reporting backends.
pub trait EventSink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `log::info!` / `log::error!`.
pub struct LogSink;

impl EventSink for LogSink {
    fn info(&self, message: &str) {
        log::info!(target: "scalaron", "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: "scalaron", "{message}");
    }
}

/// Discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn info(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkLevel {
    Info,
    Error,
}

/// Records messages in memory. Thread-safe: the record list is guarded
/// by a `parking_lot::Mutex`, so one sink can serve a parallel sweep.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(SinkLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<(SinkLevel, String)> {
        self.records.lock().clone()
    }

    pub fn messages(&self, level: SinkLevel) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn info(&self, message: &str) {
        self.records.lock().push((SinkLevel::Info, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.records.lock().push((SinkLevel::Error, message.to_string()));
    }
}
