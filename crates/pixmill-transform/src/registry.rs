//! The transform registry: preset -> pure pixel operation.

use image::{DynamicImage, RgbImage};
use tracing::debug;

use pixmill_models::{OutputFormat, Preset};

use crate::codec::{decode_image, encode_image};
use crate::error::TransformResult;
use crate::ops;

/// Apply a preset to a decoded image.
///
/// Deterministic: identical pixels and params produce identical output.
/// Paletted/alpha sources are normalized to RGB8 before any preset runs;
/// an identity preset returns the normalized source unchanged.
pub fn apply(image: &DynamicImage, preset: &Preset) -> RgbImage {
    let rgb = image.to_rgb8();
    match preset {
        Preset::Grayscale => ops::grayscale(&rgb),
        Preset::Resize { width, height } => ops::resize(&rgb, *width, *height),
        Preset::Rotate { deg } => ops::rotate(&rgb, *deg),
        Preset::Thumb => ops::thumb(&rgb),
        Preset::Watermark { text } => ops::watermark(&rgb, text),
        Preset::Identity { mode } => {
            debug!(mode = %mode, "unrecognized preset, passing image through");
            rgb
        }
    }
}

/// Bytes-in, bytes-out entry point: decode, apply, encode.
pub fn render(input: &[u8], preset: &Preset, format: OutputFormat) -> TransformResult<Vec<u8>> {
    let decoded = decode_image(input)?;
    let output = apply(&decoded, preset);
    encode_image(&output, format)
}
