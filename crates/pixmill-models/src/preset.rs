//! Preset vocabulary and per-preset parameters.
//!
//! Wire messages carry a free-form `mode` string and an open `params` map;
//! both are narrowed here into a closed set of typed variants. Unrecognized
//! modes become [`Preset::Identity`] (a no-op, not an error), and absent or
//! malformed parameters fall back to the preset defaults.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Default rotation when `deg` is absent or malformed.
pub const DEFAULT_ROTATE_DEG: f32 = 90.0;

/// Default watermark text.
pub const DEFAULT_WATERMARK_TEXT: &str = "\u{a9}";

/// Edge length of the fixed thumbnail canvas.
pub const THUMB_SIZE: u32 = 256;

/// Background fill of the thumbnail canvas.
pub const THUMB_BACKGROUND: [u8; 3] = [245, 245, 245];

/// JPEG encode quality for non-PNG outputs.
pub const JPEG_QUALITY: u8 = 92;

/// Raw params map as carried on the wire.
pub type ParamMap = BTreeMap<String, Value>;

/// A named, parameterized image transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Preset {
    /// Full desaturation; output stays 3-channel.
    Grayscale,
    /// Scale to the given dimensions; a missing axis keeps the source value.
    Resize {
        width: Option<u32>,
        height: Option<u32>,
    },
    /// Rotate clockwise by `deg` degrees, expanding the canvas to fit.
    Rotate { deg: f32 },
    /// Fit into a 256x256 light-gray canvas, aspect preserved.
    Thumb,
    /// Bottom-right text overlay on a semi-transparent dark box.
    Watermark { text: String },
    /// Unrecognized mode: pass the image through unchanged.
    Identity { mode: String },
}

impl Preset {
    /// Narrow a wire-level `(mode, params)` pair into a typed preset.
    pub fn from_wire(mode: &str, params: &ParamMap) -> Self {
        match mode {
            "grayscale" => Preset::Grayscale,
            "resize" => Preset::Resize {
                width: dimension(params, "width"),
                height: dimension(params, "height"),
            },
            "rotate" => Preset::Rotate {
                deg: degrees(params, "deg").unwrap_or(DEFAULT_ROTATE_DEG),
            },
            "thumb" => Preset::Thumb,
            "watermark" => Preset::Watermark {
                text: text(params, "text").unwrap_or_else(|| DEFAULT_WATERMARK_TEXT.to_string()),
            },
            other => Preset::Identity {
                mode: other.to_string(),
            },
        }
    }

    /// The wire-level mode name.
    pub fn name(&self) -> &str {
        match self {
            Preset::Grayscale => "grayscale",
            Preset::Resize { .. } => "resize",
            Preset::Rotate { .. } => "rotate",
            Preset::Thumb => "thumb",
            Preset::Watermark { .. } => "watermark",
            Preset::Identity { mode } => mode,
        }
    }

    /// True when applying this preset returns the source unchanged.
    pub fn is_identity(&self) -> bool {
        matches!(self, Preset::Identity { .. })
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Grayscale | Preset::Thumb | Preset::Identity { .. } => {
                write!(f, "{}", self.name())
            }
            Preset::Resize { width, height } => {
                write!(
                    f,
                    "resize(width={}, height={})",
                    opt(width.as_ref()),
                    opt(height.as_ref())
                )
            }
            Preset::Rotate { deg } => write!(f, "rotate(deg={deg})"),
            Preset::Watermark { text } => write!(f, "watermark(text={text:?})"),
        }
    }
}

fn opt<T: fmt::Display>(v: Option<&T>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

/// Read a pixel dimension: JSON number or numeric string, anything else None.
fn dimension(params: &ParamMap, name: &str) -> Option<u32> {
    match params.get(name)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Read a rotation angle: JSON number or numeric string.
fn degrees(params: &ParamMap, name: &str) -> Option<f32> {
    match params.get(name)? {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Read a text parameter: strings verbatim, numbers stringified.
fn text(params: &ParamMap, name: &str) -> Option<String> {
    match params.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> ParamMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn known_modes_map_to_variants() {
        assert_eq!(
            Preset::from_wire("grayscale", &ParamMap::new()),
            Preset::Grayscale
        );
        assert_eq!(Preset::from_wire("thumb", &ParamMap::new()), Preset::Thumb);
    }

    #[test]
    fn resize_params_are_optional() {
        let p = Preset::from_wire("resize", &params(&[("width", json!(400))]));
        assert_eq!(
            p,
            Preset::Resize {
                width: Some(400),
                height: None
            }
        );
    }

    #[test]
    fn resize_accepts_numeric_strings() {
        let p = Preset::from_wire(
            "resize",
            &params(&[("width", json!("400")), ("height", json!("300"))]),
        );
        assert_eq!(
            p,
            Preset::Resize {
                width: Some(400),
                height: Some(300)
            }
        );
    }

    #[test]
    fn malformed_resize_params_fall_back_to_defaults() {
        let p = Preset::from_wire(
            "resize",
            &params(&[("width", json!("four hundred")), ("height", json!(true))]),
        );
        assert_eq!(
            p,
            Preset::Resize {
                width: None,
                height: None
            }
        );
    }

    #[test]
    fn rotate_defaults_to_ninety() {
        assert_eq!(
            Preset::from_wire("rotate", &ParamMap::new()),
            Preset::Rotate { deg: 90.0 }
        );
        assert_eq!(
            Preset::from_wire("rotate", &params(&[("deg", json!("45.5"))])),
            Preset::Rotate { deg: 45.5 }
        );
        assert_eq!(
            Preset::from_wire("rotate", &params(&[("deg", json!(null))])),
            Preset::Rotate { deg: 90.0 }
        );
    }

    #[test]
    fn watermark_text_default_and_numeric() {
        assert_eq!(
            Preset::from_wire("watermark", &ParamMap::new()),
            Preset::Watermark {
                text: "\u{a9}".to_string()
            }
        );
        assert_eq!(
            Preset::from_wire("watermark", &params(&[("text", json!(2024))])),
            Preset::Watermark {
                text: "2024".to_string()
            }
        );
    }

    #[test]
    fn unknown_mode_is_identity() {
        let p = Preset::from_wire("sepia", &ParamMap::new());
        assert!(p.is_identity());
        assert_eq!(p.name(), "sepia");
    }
}
