//! Transport encoding for chunk payloads.
//!
//! Chunks travel as standard base64 (with padding) so that every byte
//! value survives a text-only channel.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::ProtocolError;

/// Encodes raw chunk bytes for the `data` field of a chunk record.
pub fn encode_chunk(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes the `data` field of a chunk record back into raw bytes.
pub fn decode_chunk(data: &str) -> Result<Vec<u8>, ProtocolError> {
    Ok(STANDARD.decode(data)?)
}
