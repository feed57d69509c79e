//! The work queue capability consumed by the worker.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::QueueResult;
use crate::message::Message;

/// At-least-once delivery queue with per-message visibility windows.
///
/// A received message stays hidden from other consumers for the visibility
/// timeout; if it is not deleted within that window it becomes eligible for
/// redelivery. Deletion is the explicit acknowledgment that permanently
/// removes a message.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Receive up to `max_messages`, waiting up to `wait` for the first.
    ///
    /// Messages already delivered but unacknowledged past
    /// `visibility_timeout` may be redelivered by this call.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
        visibility_timeout: Duration,
    ) -> QueueResult<Vec<Message>>;

    /// Acknowledge a delivery, permanently removing the message.
    async fn delete(&self, receipt: &str) -> QueueResult<()>;

    /// Move a delivery to the dead-letter stream, then acknowledge it.
    async fn dead_letter(&self, receipt: &str, body: &[u8], error: &str) -> QueueResult<()>;

    /// Enqueue a message body; returns the assigned message ID.
    async fn send(&self, body: &[u8]) -> QueueResult<String>;

    /// Approximate number of messages in the queue.
    async fn depth(&self) -> QueueResult<u64>;
}
