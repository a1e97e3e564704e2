//! Error types for channel records.

/// Errors produced while reading or writing channel records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("record has an empty transfer id")]
    EmptyId,

    #[error("invalid chunk encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
}
