//! The delivery envelope handed to consumers.

/// One received message.
///
/// `body` is opaque to the queue; decoding happens at the consumer. The
/// receipt handle is the single-use token required to acknowledge (delete)
/// or dead-letter this delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Serialized job payload (or a legacy bare key).
    pub body: Vec<u8>,
    /// Receipt handle for delete/dead-letter.
    pub receipt: String,
}

impl Message {
    pub fn new(body: impl Into<Vec<u8>>, receipt: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            receipt: receipt.into(),
        }
    }
}
