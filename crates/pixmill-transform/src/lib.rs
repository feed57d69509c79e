//! Preset image transforms.
//!
//! This crate provides:
//! - The transform registry: preset -> pure pixel operation
//! - Decode/encode helpers (PNG, quality-92 JPEG)
//! - The embedded glyph face used by the watermark preset
//!
//! Everything here is pure and deterministic: no I/O, no clocks, identical
//! input bytes and params always produce identical output.

pub mod codec;
pub mod error;
pub mod font;
pub mod ops;
pub mod registry;

pub use codec::{decode_image, encode_image};
pub use error::{TransformError, TransformResult};
pub use registry::{apply, render};
