//! Best-effort job event emission.
//!
//! Events feed external log collection. Emission is fire-and-forget: a sink
//! that drops or garbles an event must never influence whether the job
//! succeeded, so the interface is infallible at the call site.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// A job lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// A job was decoded and is about to run.
    Processing { key: String, preset: String },
    /// The output artifact was written.
    Processed { key: String, output_key: String },
    /// The job failed; the message was disposed of per policy.
    Failed { key: String, error: String },
    /// The message was undecodable or out of namespace and was dropped.
    Dropped { key: String },
}

/// Sink for job events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &JobEvent);
}

/// Sink that forwards events to the tracing subscriber.
///
/// Holds its own sequence counter as instance state so multiple sinks (or
/// tests) never contend on process-wide globals.
#[derive(Debug, Default)]
pub struct TracingSink {
    seq: AtomicU64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far.
    pub fn emitted(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }
}

impl EventSink for TracingSink {
    fn emit(&self, event: &JobEvent) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        match event {
            JobEvent::Processing { key, preset } => {
                info!(seq, key = %key, preset = %preset, "event: processing");
            }
            JobEvent::Processed { key, output_key } => {
                info!(seq, key = %key, output_key = %output_key, "event: processed");
            }
            JobEvent::Failed { key, error } => {
                info!(seq, key = %key, error = %error, "event: failed");
            }
            JobEvent::Dropped { key } => {
                info!(seq, key = %key, "event: dropped");
            }
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &JobEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_sink_counts_sequentially() {
        let sink = TracingSink::new();
        sink.emit(&JobEvent::Dropped { key: "a".into() });
        sink.emit(&JobEvent::Dropped { key: "b".into() });
        assert_eq!(sink.emitted(), 2);
    }

    #[test]
    fn null_sink_accepts_everything() {
        let sink = NullSink;
        sink.emit(&JobEvent::Failed {
            key: "k".into(),
            error: "e".into(),
        });
    }
}
