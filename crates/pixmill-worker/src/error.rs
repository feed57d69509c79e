//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] pixmill_storage::StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] pixmill_queue::QueueError),

    #[error("Transform error: {0}")]
    Transform(#[from] pixmill_transform::TransformError),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }
}
