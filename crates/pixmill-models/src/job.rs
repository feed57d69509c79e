//! The unit of work consumed by the worker.

use serde::{Deserialize, Serialize};

use crate::key::{output_key, OutputFormat};
use crate::preset::Preset;

/// A decoded, validated transform job.
///
/// Immutable once decoded. A job has no identity beyond its `key`; two jobs
/// targeting the same key race on the output object and the last write wins.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformJob {
    /// Source object key, always inside the `uploads/` namespace.
    pub key: String,
    /// Transform to apply.
    pub preset: Preset,
    /// Carried for audit only; never validated.
    pub owner: Option<String>,
}

impl TransformJob {
    /// Create a job for a key with the given preset.
    pub fn new(key: impl Into<String>, preset: Preset) -> Self {
        Self {
            key: key.into(),
            preset,
            owner: None,
        }
    }

    /// Attach an owner for audit trails.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Destination key for the output artifact.
    pub fn output_key(&self) -> String {
        output_key(&self.key)
    }

    /// Output encoding, derived from the source filename extension.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::for_key(&self.key)
    }
}

/// Wire shape of a structured queue message, producer side.
///
/// The worker never deserializes into this directly (see [`crate::decode`]);
/// it exists so producers serialize the exact shape the decoder expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePayload {
    pub key: String,
    pub mode: String,
    #[serde(default)]
    pub params: crate::preset::ParamMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_key_and_format() {
        let job = TransformJob::new("uploads/u1/cat.png", Preset::Grayscale);
        assert_eq!(job.output_key(), "processed/cat.png");
        assert_eq!(job.output_format(), OutputFormat::Png);

        let job = TransformJob::new("uploads/u1/cat.jpg", Preset::Thumb);
        assert_eq!(job.output_format(), OutputFormat::Jpeg);
    }

    #[test]
    fn wire_payload_round_trips() {
        let payload = WirePayload {
            key: "uploads/u1/cat.jpg".to_string(),
            mode: "resize".to_string(),
            params: [("width".to_string(), serde_json::json!(400))]
                .into_iter()
                .collect(),
            owner: Some("u1".to_string()),
        };
        let json = serde_json::to_string(&payload).expect("serialize payload");
        let back: WirePayload = serde_json::from_str(&json).expect("deserialize payload");
        assert_eq!(back.key, payload.key);
        assert_eq!(back.mode, payload.mode);
        assert_eq!(back.params, payload.params);
        assert_eq!(back.owner, payload.owner);
    }
}
