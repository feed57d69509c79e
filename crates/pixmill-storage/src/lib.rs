//! Object storage for the PixMill pipeline.
//!
//! This crate provides:
//! - The `ObjectStore` capability trait the worker consumes
//! - An S3-compatible client (AWS S3 or any endpoint speaking the S3 API)
//! - An in-memory store for tests

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use store::ObjectStore;
