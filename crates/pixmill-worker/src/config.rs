//! Worker configuration.

use std::time::Duration;

/// What to do with a message whose job failed during processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Delete the message anyway: one attempt, then the job is gone.
    /// This is the legacy behavior.
    #[default]
    Delete,
    /// Move the message to the dead-letter stream for inspection.
    DeadLetter,
}

impl FailurePolicy {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "delete" => Some(FailurePolicy::Delete),
            "dead_letter" | "dead-letter" | "dlq" => Some(FailurePolicy::DeadLetter),
            _ => None,
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Messages requested per receive call
    pub batch_size: usize,
    /// Long-poll wait on an empty queue
    pub poll_wait: Duration,
    /// Visibility window granted per received message.
    /// Must exceed worst-case single-image latency or another worker can
    /// pick up the same job mid-flight.
    pub visibility_timeout: Duration,
    /// Pause after dispatching a non-empty batch
    pub batch_pause: Duration,
    /// Sleep after a failed receive call before retrying
    pub receive_backoff: Duration,
    /// Concurrent in-flight jobs, never more than the batch size
    pub max_concurrent: usize,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Failed-job disposition
    pub failure_policy: FailurePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            poll_wait: Duration::from_secs(10),
            visibility_timeout: Duration::from_secs(120),
            batch_pause: Duration::from_millis(300),
            receive_backoff: Duration::from_secs(2),
            max_concurrent: 5,
            shutdown_timeout: Duration::from_secs(30),
            failure_policy: FailurePolicy::Delete,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let batch_size = std::env::var("WORKER_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(5);
        Self {
            batch_size,
            poll_wait: Duration::from_secs(
                std::env::var("WORKER_POLL_WAIT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            visibility_timeout: Duration::from_secs(
                std::env::var("WORKER_VISIBILITY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            batch_pause: Duration::from_millis(
                std::env::var("WORKER_BATCH_PAUSE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            receive_backoff: Duration::from_secs(
                std::env::var("WORKER_RECEIVE_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            max_concurrent: std::env::var("WORKER_MAX_CONCURRENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(batch_size)
                .min(batch_size),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            failure_policy: std::env::var("WORKER_FAILURE_POLICY")
                .ok()
                .and_then(|s| FailurePolicy::parse(&s))
                .unwrap_or_default(),
        }
    }
}
