//! In-memory work queue for tests.
//!
//! Implements the same contract as the Redis Streams queue, including real
//! visibility-window semantics: a received message is hidden until its
//! window lapses, then becomes eligible for redelivery. Receive failures
//! can be injected to exercise the consumer loop's retry path.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{QueueError, QueueResult};
use crate::message::Message;
use crate::queue::WorkQueue;

#[derive(Debug, Clone)]
struct QueuedMessage {
    id: u64,
    body: Vec<u8>,
    invisible_until: Option<Instant>,
    deliveries: u32,
}

/// A message that was moved to the dead-letter side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub body: Vec<u8>,
    pub error: String,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    messages: Vec<QueuedMessage>,
    dead: Vec<DeadLetter>,
    deleted: u64,
    fail_receives: u32,
}

/// Mutex-backed queue with visibility-window semantics.
#[derive(Default)]
pub struct MemoryQueue {
    inner: Mutex<Inner>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` receive calls fail with a connection error.
    pub fn inject_receive_failures(&self, n: u32) {
        self.inner.lock().unwrap().fail_receives = n;
    }

    /// Messages currently in the queue (visible or not).
    pub fn remaining(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    /// Messages acknowledged so far.
    pub fn deleted(&self) -> u64 {
        self.inner.lock().unwrap().deleted
    }

    /// Dead-lettered messages.
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.inner.lock().unwrap().dead.clone()
    }

    /// Delivery count for a message by receipt.
    pub fn deliveries(&self, receipt: &str) -> u32 {
        let inner = self.inner.lock().unwrap();
        inner
            .messages
            .iter()
            .find(|m| m.id.to_string() == receipt)
            .map(|m| m.deliveries)
            .unwrap_or(0)
    }

    fn try_receive(
        &self,
        max_messages: usize,
        visibility_timeout: Duration,
    ) -> QueueResult<Vec<Message>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_receives > 0 {
            inner.fail_receives -= 1;
            return Err(QueueError::connection_failed("injected receive failure"));
        }

        let now = Instant::now();
        let mut received = Vec::new();
        for msg in inner.messages.iter_mut() {
            if received.len() >= max_messages {
                break;
            }
            let visible = msg.invisible_until.map_or(true, |t| t <= now);
            if visible {
                msg.invisible_until = Some(now + visibility_timeout);
                msg.deliveries += 1;
                received.push(Message::new(msg.body.clone(), msg.id.to_string()));
            }
        }
        Ok(received)
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
        visibility_timeout: Duration,
    ) -> QueueResult<Vec<Message>> {
        let deadline = Instant::now() + wait;
        loop {
            let batch = self.try_receive(max_messages, visibility_timeout)?;
            if !batch.is_empty() || Instant::now() >= deadline {
                return Ok(batch);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn delete(&self, receipt: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.messages.len();
        inner.messages.retain(|m| m.id.to_string() != receipt);
        if inner.messages.len() < before {
            inner.deleted += 1;
        }
        Ok(())
    }

    async fn dead_letter(&self, receipt: &str, body: &[u8], error: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.messages.retain(|m| m.id.to_string() != receipt);
        inner.dead.push(DeadLetter {
            body: body.to_vec(),
            error: error.to_string(),
        });
        Ok(())
    }

    async fn send(&self, body: &[u8]) -> QueueResult<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.messages.push(QueuedMessage {
            id,
            body: body.to_vec(),
            invisible_until: None,
            deliveries: 0,
        });
        Ok(id.to_string())
    }

    async fn depth(&self) -> QueueResult<u64> {
        Ok(self.inner.lock().unwrap().messages.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VISIBILITY: Duration = Duration::from_millis(40);
    const NO_WAIT: Duration = Duration::ZERO;

    #[tokio::test]
    async fn received_message_is_hidden_until_window_lapses() {
        let queue = MemoryQueue::new();
        queue.send(b"one").await.expect("send");

        let first = queue.receive(5, NO_WAIT, VISIBILITY).await.expect("receive");
        assert_eq!(first.len(), 1);

        // Hidden while the window is open.
        let second = queue.receive(5, NO_WAIT, VISIBILITY).await.expect("receive");
        assert!(second.is_empty());

        // Redelivered after it lapses.
        tokio::time::sleep(VISIBILITY * 2).await;
        let third = queue.receive(5, NO_WAIT, VISIBILITY).await.expect("receive");
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].body, b"one");
    }

    #[tokio::test]
    async fn delete_removes_permanently() {
        let queue = MemoryQueue::new();
        queue.send(b"one").await.expect("send");

        let batch = queue.receive(5, NO_WAIT, VISIBILITY).await.expect("receive");
        queue.delete(&batch[0].receipt).await.expect("delete");

        tokio::time::sleep(VISIBILITY * 2).await;
        let again = queue.receive(5, NO_WAIT, VISIBILITY).await.expect("receive");
        assert!(again.is_empty());
        assert_eq!(queue.deleted(), 1);
        assert_eq!(queue.remaining(), 0);
    }

    #[tokio::test]
    async fn receive_respects_batch_size() {
        let queue = MemoryQueue::new();
        for i in 0..7u8 {
            queue.send(&[i]).await.expect("send");
        }
        let batch = queue.receive(5, NO_WAIT, VISIBILITY).await.expect("receive");
        assert_eq!(batch.len(), 5);
        assert_eq!(queue.depth().await.expect("depth"), 7);
    }

    #[tokio::test]
    async fn dead_letter_moves_message() {
        let queue = MemoryQueue::new();
        queue.send(b"bad").await.expect("send");

        let batch = queue.receive(5, NO_WAIT, VISIBILITY).await.expect("receive");
        queue
            .dead_letter(&batch[0].receipt, &batch[0].body, "boom")
            .await
            .expect("dead letter");

        assert_eq!(queue.remaining(), 0);
        let dead = queue.dead_letters();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].body, b"bad");
        assert_eq!(dead[0].error, "boom");
    }

    #[tokio::test]
    async fn injected_failures_surface_then_clear() {
        let queue = MemoryQueue::new();
        queue.send(b"one").await.expect("send");
        queue.inject_receive_failures(1);

        let err = queue.receive(5, NO_WAIT, VISIBILITY).await.unwrap_err();
        assert!(matches!(err, QueueError::ConnectionFailed(_)));

        let batch = queue.receive(5, NO_WAIT, VISIBILITY).await.expect("receive");
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn receive_waits_for_late_arrivals() {
        let queue = std::sync::Arc::new(MemoryQueue::new());
        let sender = std::sync::Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            sender.send(b"late").await.expect("send");
        });

        let batch = queue
            .receive(5, Duration::from_millis(500), VISIBILITY)
            .await
            .expect("receive");
        assert_eq!(batch.len(), 1);
    }
}
