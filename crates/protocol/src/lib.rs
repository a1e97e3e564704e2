//! Channel records exchanged between the sandboxed content environment
//! and the host process.
//!
//! Every blob transfer is a `start` record, `totalChunks` `chunk` records
//! and exactly one terminal `finish` or `error` record, all correlated by
//! the transfer id.

pub mod constants;
pub mod encoding;
pub mod error;
pub mod messages;
pub mod mime;

// Re-export primary types for convenience.
pub use constants::{DEFAULT_CHUNK_SIZE, DEFAULT_FILENAME};
pub use encoding::{decode_chunk, encode_chunk};
pub use error::ProtocolError;
pub use messages::{ChannelMessage, ChunkRecord, ErrorRecord, FinishRecord, StartRecord};
pub use mime::extension_for_mime;
