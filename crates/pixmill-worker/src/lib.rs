//! Image transform worker.
//!
//! This crate provides:
//! - The consumer loop: receive, decode, transform, persist, acknowledge
//! - Per-message failure isolation and the delete/dead-letter policy
//! - Best-effort job event emission
//! - Graceful shutdown

pub mod config;
pub mod consumer;
pub mod error;
pub mod events;

pub use config::{FailurePolicy, WorkerConfig};
pub use consumer::ConsumerLoop;
pub use error::{WorkerError, WorkerResult};
pub use events::{EventSink, JobEvent, NullSink, TracingSink};
