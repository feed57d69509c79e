//! Object key conventions.
//!
//! Inputs live under `uploads/<owner>/<filename>`; outputs are written to
//! `processed/<basename>` and overwrite whatever is already there (last
//! writer wins, no output-side versioning).

/// Namespace prefix required on every input key.
pub const UPLOADS_PREFIX: &str = "uploads/";

/// Prefix under which output artifacts are written.
pub const PROCESSED_PREFIX: &str = "processed/";

/// Returns true if the key is inside the upload namespace.
///
/// This is the sole sanity check applied to incoming jobs; keys outside
/// the namespace are discarded, not retried.
pub fn in_upload_namespace(key: &str) -> bool {
    key.starts_with(UPLOADS_PREFIX)
}

/// The filename component of a key (everything after the last `/`).
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Derive the output key for an input key: `processed/<basename>`.
pub fn output_key(key: &str) -> String {
    format!("{}{}", PROCESSED_PREFIX, basename(key))
}

/// Output encoding, chosen from the source filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless PNG (source had a `.png` extension).
    Png,
    /// Baseline JPEG at quality 92 (everything else).
    Jpeg,
}

impl OutputFormat {
    /// Pick the output format for a source key.
    pub fn for_key(key: &str) -> Self {
        let name = basename(key);
        let ext = name.len().checked_sub(4).and_then(|i| name.get(i..));
        if ext.is_some_and(|e| e.eq_ignore_ascii_case(".png")) {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg
        }
    }

    /// Content type to set on the stored output object.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_check() {
        assert!(in_upload_namespace("uploads/abc/1.jpg"));
        assert!(!in_upload_namespace("processed/1.jpg"));
        assert!(!in_upload_namespace("Uploads/abc/1.jpg"));
        assert!(!in_upload_namespace(""));
    }

    #[test]
    fn output_key_strips_owner_directory() {
        assert_eq!(output_key("uploads/abc/photo.jpg"), "processed/photo.jpg");
        assert_eq!(output_key("uploads/photo.png"), "processed/photo.png");
        assert_eq!(output_key("photo.png"), "processed/photo.png");
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(OutputFormat::for_key("uploads/a/x.png"), OutputFormat::Png);
        assert_eq!(OutputFormat::for_key("uploads/a/x.PNG"), OutputFormat::Png);
        assert_eq!(OutputFormat::for_key("uploads/a/x.jpg"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::for_key("uploads/a/x"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::for_key("uploads/a/png"), OutputFormat::Jpeg);
    }

    #[test]
    fn content_types() {
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
        assert_eq!(OutputFormat::Jpeg.content_type(), "image/jpeg");
    }
}
