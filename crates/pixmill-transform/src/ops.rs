//! Pixel operations backing each preset.
//!
//! All operations take and return 3-channel RGB buffers; callers normalize
//! paletted/alpha sources first (see [`crate::registry::apply`]).

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use pixmill_models::{THUMB_BACKGROUND, THUMB_SIZE};

use crate::font;

/// Opacity of the watermark backing rectangle (toward black).
const RECT_ALPHA: f32 = 0.55;

/// Opacity of the watermark text (toward white).
const TEXT_ALPHA: f32 = 0.9;

/// Full desaturation, keeping the 3-channel colour model.
pub fn grayscale(img: &RgbImage) -> RgbImage {
    let luma = imageops::grayscale(img);
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let l = luma.get_pixel(x, y)[0];
        Rgb([l, l, l])
    })
}

/// Scale to the given dimensions; a missing axis keeps the source value.
/// Each axis is clamped to at least one pixel.
pub fn resize(img: &RgbImage, width: Option<u32>, height: Option<u32>) -> RgbImage {
    let (sw, sh) = img.dimensions();
    let w = width.unwrap_or(sw).max(1);
    let h = height.unwrap_or(sh).max(1);
    if (w, h) == (sw, sh) {
        return img.clone();
    }
    imageops::resize(img, w, h, FilterType::Lanczos3)
}

/// Rotate clockwise by `deg` degrees, expanding the canvas to fit.
///
/// Exact quarter turns use the lossless buffer rotations; anything else is
/// inverse-mapped bilinear resampling into the rotated bounding box, with
/// black fill outside the source.
pub fn rotate(img: &RgbImage, deg: f32) -> RgbImage {
    let turns = (deg as f64).rem_euclid(360.0);
    if turns == 0.0 {
        return img.clone();
    }
    if turns == 90.0 {
        return imageops::rotate90(img);
    }
    if turns == 180.0 {
        return imageops::rotate180(img);
    }
    if turns == 270.0 {
        return imageops::rotate270(img);
    }
    rotate_expand(img, turns)
}

fn rotate_expand(img: &RgbImage, deg: f64) -> RgbImage {
    let (w, h) = img.dimensions();
    let theta = deg.to_radians();
    let (sin, cos) = theta.sin_cos();

    let out_w = ((w as f64 * cos.abs()) + (h as f64 * sin.abs())).ceil() as u32;
    let out_h = ((w as f64 * sin.abs()) + (h as f64 * cos.abs())).ceil() as u32;

    let cx_src = w as f64 / 2.0;
    let cy_src = h as f64 / 2.0;
    let cx_dst = out_w as f64 / 2.0;
    let cy_dst = out_h as f64 / 2.0;

    RgbImage::from_fn(out_w, out_h, |dx, dy| {
        let xr = dx as f64 + 0.5 - cx_dst;
        let yr = dy as f64 + 0.5 - cy_dst;
        // Inverse of the clockwise rotation (screen coordinates, y down).
        let sx = cos * xr + sin * yr + cx_src - 0.5;
        let sy = -sin * xr + cos * yr + cy_src - 0.5;
        sample_bilinear(img, sx, sy)
    })
}

fn sample_bilinear(img: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (w, h) = img.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let mut acc = [0.0f64; 3];
    for (dx, dy, wgt) in [
        (0i64, 0i64, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ] {
        let px = x0 as i64 + dx;
        let py = y0 as i64 + dy;
        if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
            let p = img.get_pixel(px as u32, py as u32);
            for c in 0..3 {
                acc[c] += p[c] as f64 * wgt;
            }
        }
    }
    Rgb([
        acc[0].round().clamp(0.0, 255.0) as u8,
        acc[1].round().clamp(0.0, 255.0) as u8,
        acc[2].round().clamp(0.0, 255.0) as u8,
    ])
}

/// Scale to fit a 256x256 box (downscale only, aspect preserved) and center
/// on a light-gray canvas of exactly 256x256.
pub fn thumb(img: &RgbImage) -> RgbImage {
    let (w, h) = img.dimensions();
    let scaled;
    let fitted = if w > THUMB_SIZE || h > THUMB_SIZE {
        let ratio = (THUMB_SIZE as f64 / w as f64).min(THUMB_SIZE as f64 / h as f64);
        let nw = ((w as f64 * ratio).round() as u32).clamp(1, THUMB_SIZE);
        let nh = ((h as f64 * ratio).round() as u32).clamp(1, THUMB_SIZE);
        scaled = imageops::resize(img, nw, nh, FilterType::Lanczos3);
        &scaled
    } else {
        img
    };

    let mut canvas = RgbImage::from_pixel(THUMB_SIZE, THUMB_SIZE, Rgb(THUMB_BACKGROUND));
    let (fw, fh) = fitted.dimensions();
    let x = i64::from((THUMB_SIZE - fw) / 2);
    let y = i64::from((THUMB_SIZE - fh) / 2);
    imageops::overlay(&mut canvas, fitted, x, y);
    canvas
}

/// Bottom-right watermark: semi-transparent dark rectangle sized to the
/// text bounding box plus padding, text in near-opaque white on top.
/// Padding is max(10, width / 100); glyphs scale with image width.
pub fn watermark(img: &RgbImage, text: &str) -> RgbImage {
    let mut out = img.clone();
    let (w, h) = out.dimensions();
    let pad = (w / 100).max(10);
    let scale = (w / 256).max(1);

    let text_w = font::text_width(text, scale);
    let text_h = font::text_height(scale);
    let x0 = w.saturating_sub(text_w + 2 * pad);
    let y0 = h.saturating_sub(text_h + 2 * pad);

    for y in y0..h {
        for x in x0..w {
            let p = out.get_pixel_mut(x, y);
            for c in 0..3 {
                p[c] = (p[c] as f32 * (1.0 - RECT_ALPHA)).round() as u8;
            }
        }
    }

    draw_text(&mut out, text, x0 + pad, y0 + pad, scale);
    out
}

fn draw_text(img: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32) {
    let (w, h) = img.dimensions();
    let mut pen_x = x;
    for ch in text.chars() {
        let rows = font::glyph(ch);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..font::GLYPH_WIDTH {
                if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                // One font cell becomes a scale x scale block.
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = pen_x + col * scale + sx;
                        let py = y + row as u32 * scale + sy;
                        if px < w && py < h {
                            let p = img.get_pixel_mut(px, py);
                            for c in 0..3 {
                                p[c] = (p[c] as f32 * (1.0 - TEXT_ALPHA)
                                    + 255.0 * TEXT_ALPHA)
                                    .round() as u8;
                            }
                        }
                    }
                }
            }
        }
        pen_x += font::GLYPH_ADVANCE * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                128,
            ])
        })
    }

    #[test]
    fn grayscale_keeps_three_equal_channels() {
        let out = grayscale(&solid(8, 8, [200, 100, 50]));
        let p = out.get_pixel(4, 4);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_ne!(p[0], 200);
    }

    #[test]
    fn resize_keeps_missing_dimension() {
        let out = resize(&gradient(800, 600), Some(400), None);
        assert_eq!(out.dimensions(), (400, 600));
    }

    #[test]
    fn resize_clamps_to_one_pixel() {
        let out = resize(&gradient(10, 10), Some(0), Some(0));
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn resize_without_params_is_identity() {
        let src = gradient(20, 10);
        let out = resize(&src, None, None);
        assert_eq!(out.as_raw(), src.as_raw());
    }

    #[test]
    fn rotate_ninety_is_clockwise() {
        // 2x1 image: red on the left, blue on the right.
        let mut src = RgbImage::new(2, 1);
        src.put_pixel(0, 0, Rgb([255, 0, 0]));
        src.put_pixel(1, 0, Rgb([0, 0, 255]));

        let out = rotate(&src, 90.0);
        assert_eq!(out.dimensions(), (1, 2));
        // Clockwise: the left pixel ends up on top.
        assert_eq!(*out.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(0, 1), Rgb([0, 0, 255]));
    }

    #[test]
    fn rotate_full_turn_is_identity() {
        let src = gradient(12, 8);
        assert_eq!(rotate(&src, 360.0).as_raw(), src.as_raw());
        assert_eq!(rotate(&src, 0.0).as_raw(), src.as_raw());
    }

    #[test]
    fn rotate_arbitrary_expands_canvas() {
        let out = rotate(&solid(10, 10, [255, 255, 255]), 45.0);
        let (w, h) = out.dimensions();
        assert!(w > 10 && h > 10, "canvas must expand: {w}x{h}");
        // Center of the rotated content is still white.
        assert_eq!(*out.get_pixel(w / 2, h / 2), Rgb([255, 255, 255]));
        // Corners are outside the rotated square and fill black.
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn rotate_negative_angle_wraps() {
        // -270 clockwise is the same as +90 clockwise.
        let src = gradient(6, 4);
        assert_eq!(
            rotate(&src, -270.0).as_raw(),
            rotate(&src, 90.0).as_raw()
        );
    }

    #[test]
    fn thumb_is_exactly_256_with_gray_bands() {
        let out = thumb(&solid(300, 200, [255, 0, 0]));
        assert_eq!(out.dimensions(), (THUMB_SIZE, THUMB_SIZE));
        // Landscape source: bands above and below, content centered.
        assert_eq!(*out.get_pixel(128, 2), Rgb(THUMB_BACKGROUND));
        assert_eq!(*out.get_pixel(128, 253), Rgb(THUMB_BACKGROUND));
        assert_eq!(*out.get_pixel(128, 128), Rgb([255, 0, 0]));
    }

    #[test]
    fn thumb_does_not_upscale_small_sources() {
        let out = thumb(&solid(100, 50, [0, 255, 0]));
        assert_eq!(out.dimensions(), (THUMB_SIZE, THUMB_SIZE));
        // Content sits centered at original size.
        assert_eq!(*out.get_pixel(128, 128), Rgb([0, 255, 0]));
        assert_eq!(*out.get_pixel(128, 90), Rgb(THUMB_BACKGROUND));
        assert_eq!(*out.get_pixel(50, 128), Rgb(THUMB_BACKGROUND));
    }

    #[test]
    fn watermark_darkens_bottom_right_only() {
        let out = watermark(&solid(400, 300, [255, 255, 255]), "\u{a9}");
        // Top-left untouched.
        assert_eq!(*out.get_pixel(10, 10), Rgb([255, 255, 255]));
        // Bottom-right corner sits inside the backing rectangle.
        let corner = out.get_pixel(398, 298);
        assert!(corner[0] < 200, "corner should be darkened: {corner:?}");
    }

    #[test]
    fn watermark_renders_light_text_in_box() {
        let out = watermark(&solid(400, 300, [0, 0, 0]), "W");
        // Some pixel in the text area must be near-white.
        let lit = out
            .pixels()
            .filter(|p| p[0] > 200 && p[1] > 200 && p[2] > 200)
            .count();
        assert!(lit > 0, "text pixels should be drawn");
    }

    #[test]
    fn watermark_on_tiny_image_does_not_panic() {
        let out = watermark(&solid(8, 8, [128, 128, 128]), "\u{a9}");
        assert_eq!(out.dimensions(), (8, 8));
    }
}
