//! Shared data models for the PixMill pipeline.
//!
//! This crate provides:
//! - The transform job record and preset vocabulary
//! - Message-body decoding (structured JSON or legacy bare-key)
//! - Object key conventions for the upload/processed namespaces

pub mod decode;
pub mod job;
pub mod key;
pub mod preset;

pub use decode::{decode, Decoded};
pub use job::{TransformJob, WirePayload};
pub use key::{basename, in_upload_namespace, output_key, OutputFormat, PROCESSED_PREFIX, UPLOADS_PREFIX};
pub use preset::{ParamMap, Preset, DEFAULT_ROTATE_DEG, DEFAULT_WATERMARK_TEXT, JPEG_QUALITY, THUMB_BACKGROUND, THUMB_SIZE};
