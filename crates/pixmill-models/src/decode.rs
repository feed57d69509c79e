//! Message-body decoding.
//!
//! Queue bodies arrive in one of two shapes: a JSON object with `key` and
//! optional `mode`/`params`/`owner`, or (from older producers) a bare object
//! key string. Decoding never fails outright: any structural parse failure
//! takes the legacy bare-key path, and only a key outside the `uploads/`
//! namespace produces a rejection. Rejected messages must still be deleted
//! by the caller so they are not redelivered.

use serde::Deserialize;
use serde_json::Value;

use crate::job::TransformJob;
use crate::key::in_upload_namespace;
use crate::preset::{ParamMap, Preset};

/// Result of decoding one message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A valid job, ready to dispatch.
    Job(TransformJob),
    /// Undecodable or out-of-namespace; delete the message and move on.
    Rejected {
        /// The key (or would-be key) that failed the namespace check.
        key: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawBody {
    key: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    params: Option<ParamMap>,
    #[serde(default)]
    owner: Option<Value>,
}

/// Decode a raw message body into a job or a rejection.
pub fn decode(raw: &[u8]) -> Decoded {
    let (key, mode, params, owner) = match serde_json::from_slice::<RawBody>(raw) {
        Ok(body) => (
            body.key,
            body.mode.unwrap_or_else(|| "grayscale".to_string()),
            body.params.unwrap_or_default(),
            body.owner.and_then(owner_string),
        ),
        // Legacy producers send the object key as the whole body.
        Err(_) => (
            String::from_utf8_lossy(raw).into_owned(),
            "grayscale".to_string(),
            ParamMap::new(),
            None,
        ),
    };

    if !in_upload_namespace(&key) {
        return Decoded::Rejected { key };
    }

    let preset = Preset::from_wire(&mode, &params);
    Decoded::Job(TransformJob {
        key,
        preset,
        owner,
    })
}

fn owner_string(v: Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
