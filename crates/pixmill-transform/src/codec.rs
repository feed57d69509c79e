//! Image decode/encode helpers.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, RgbImage};

use pixmill_models::{OutputFormat, JPEG_QUALITY};

use crate::error::{TransformError, TransformResult};

/// Decode image bytes in any supported container format.
pub fn decode_image(data: &[u8]) -> TransformResult<DynamicImage> {
    image::load_from_memory(data).map_err(|e| TransformError::decode(e.to_string()))
}

/// Encode an RGB image into the requested output format.
///
/// PNG is lossless; everything else becomes baseline JPEG at quality 92.
pub fn encode_image(img: &RgbImage, format: OutputFormat) -> TransformResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    let dynamic = DynamicImage::ImageRgb8(img.clone());

    let output = match format {
        OutputFormat::Png => ImageOutputFormat::Png,
        OutputFormat::Jpeg => ImageOutputFormat::Jpeg(JPEG_QUALITY),
    };

    dynamic
        .write_to(&mut cursor, output)
        .map_err(|e| TransformError::encode(e.to_string()))?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ])
        })
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let img = gradient(32, 16);
        let bytes = encode_image(&img, OutputFormat::Png).expect("encode png");
        let decoded = decode_image(&bytes).expect("decode png").to_rgb8();
        assert_eq!(decoded.dimensions(), (32, 16));
        assert_eq!(decoded.as_raw(), img.as_raw());
    }

    #[test]
    fn jpeg_encodes_and_decodes() {
        let img = gradient(32, 16);
        let bytes = encode_image(&img, OutputFormat::Jpeg).expect("encode jpeg");
        // JFIF magic
        assert_eq!(bytes[0], 0xff);
        assert_eq!(bytes[1], 0xd8);
        let decoded = decode_image(&bytes).expect("decode jpeg");
        assert_eq!(decoded.to_rgb8().dimensions(), (32, 16));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, TransformError::Decode(_)));
    }
}
