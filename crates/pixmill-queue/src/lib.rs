//! Work queue for the PixMill pipeline.
//!
//! This crate provides:
//! - The `WorkQueue` capability trait: at-least-once delivery with a
//!   per-message visibility window and delete-based acknowledgment
//! - A Redis Streams implementation (consumer groups; pending-entry
//!   reclaim implements the visibility window)
//! - An in-memory implementation with real visibility semantics for tests

pub mod error;
pub mod memory;
pub mod message;
pub mod queue;
pub mod redis_queue;

pub use error::{QueueError, QueueResult};
pub use memory::{DeadLetter, MemoryQueue};
pub use message::Message;
pub use queue::WorkQueue;
pub use redis_queue::{QueueConfig, RedisStreamQueue};
