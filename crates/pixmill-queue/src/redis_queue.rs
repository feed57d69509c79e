//! Redis Streams implementation of the work queue.
//!
//! A consumer group gives at-least-once delivery: entries read with
//! `XREADGROUP` stay in the pending entries list until acknowledged, and
//! `receive` reclaims entries whose idle time exceeds the visibility
//! timeout, so a crashed or stalled consumer's messages become visible
//! again. The receipt handle is the stream entry ID.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{QueueError, QueueResult};
use crate::message::Message;
use crate::queue::WorkQueue;

/// Field under which the payload is stored in each stream entry.
const BODY_FIELD: &str = "body";

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter stream name
    pub dlq_stream_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "pixmill:jobs".to_string(),
            consumer_group: "pixmill:workers".to_string(),
            dlq_stream_name: "pixmill:dlq".to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("QUEUE_STREAM")
                .unwrap_or_else(|_| "pixmill:jobs".to_string()),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or_else(|_| "pixmill:workers".to_string()),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM")
                .unwrap_or_else(|_| "pixmill:dlq".to_string()),
        }
    }
}

/// Redis Streams work queue client.
pub struct RedisStreamQueue {
    client: redis::Client,
    config: QueueConfig,
    consumer_name: String,
}

impl RedisStreamQueue {
    /// Create a new queue client.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let consumer_name = format!("worker-{}", Uuid::new_v4());
        Ok(Self {
            client,
            config,
            consumer_name,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Initialize the queue (create consumer group if not exists).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Reclaim pending entries idle longer than the visibility timeout.
    async fn claim_stale(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        min_idle: Duration,
        count: usize,
    ) -> QueueResult<Vec<Message>> {
        let pending: redis::streams::StreamPendingReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .query_async(conn)
            .await?;

        if pending.count() == 0 {
            return Ok(Vec::new());
        }

        let result: redis::streams::StreamClaimReply = redis::cmd("XCLAIM")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(&self.consumer_name)
            .arg(min_idle.as_millis() as u64)
            .arg("0-0")
            .arg("COUNT")
            .arg(count)
            .query_async(conn)
            .await?;

        let mut messages = Vec::new();
        for entry in result.ids {
            if let Some(redis::Value::BulkString(payload)) = entry.map.get(BODY_FIELD) {
                info!("Reclaimed stale delivery {}", entry.id);
                messages.push(Message::new(payload.clone(), entry.id.clone()));
            }
        }

        Ok(messages)
    }
}

#[async_trait]
impl WorkQueue for RedisStreamQueue {
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
        visibility_timeout: Duration,
    ) -> QueueResult<Vec<Message>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // Redeliveries first: entries whose visibility window has lapsed.
        let mut messages = self
            .claim_stale(&mut conn, visibility_timeout, max_messages)
            .await?;

        let remaining = max_messages.saturating_sub(messages.len());
        if remaining == 0 {
            return Ok(messages);
        }

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.consumer_name)
            .arg("COUNT")
            .arg(remaining)
            .arg("BLOCK")
            .arg(wait.as_millis() as u64)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        for stream_key in result.keys {
            for entry in stream_key.ids {
                if let Some(redis::Value::BulkString(payload)) = entry.map.get(BODY_FIELD) {
                    debug!("Received message {}", entry.id);
                    messages.push(Message::new(payload.clone(), entry.id.clone()));
                }
            }
        }

        Ok(messages)
    }

    async fn delete(&self, receipt: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(receipt)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(receipt)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Deleted message {}", receipt);
        Ok(())
    }

    async fn dead_letter(&self, receipt: &str, body: &[u8], error: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XADD")
            .arg(&self.config.dlq_stream_name)
            .arg("*")
            .arg(BODY_FIELD)
            .arg(body)
            .arg("error")
            .arg(error)
            .arg("failed_at")
            .arg(chrono::Utc::now().to_rfc3339())
            .arg("original_id")
            .arg(receipt)
            .query_async::<()>(&mut conn)
            .await?;

        self.delete(receipt).await?;

        warn!("Dead-lettered message {}: {}", receipt, error);
        Ok(())
    }

    async fn send(&self, body: &[u8]) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg(BODY_FIELD)
            .arg(body)
            .query_async(&mut conn)
            .await?;

        debug!("Enqueued message {}", message_id);
        Ok(message_id)
    }

    async fn depth(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }
}
