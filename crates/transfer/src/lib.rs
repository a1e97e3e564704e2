//! Chunked blob transfer between the sandboxed content environment and
//! the host process.
//!
//! The [`Segmenter`] splits a blob into index-tagged chunk records, the
//! [`Reassembler`] rebuilds it on the host independent of delivery order,
//! and the [`Finalizer`] stages the result for the share facility.

mod events;
mod finalizer;
mod host;
mod id;
mod reassembler;
mod segmenter;
mod session;
mod validation;

use std::time::Duration;

use blobbridge_protocol::ProtocolError;

pub use events::{BridgeEvent, Notice, NoticeKind, NoticeQueue};
pub use finalizer::{Finalizer, ShareFacility, StagedFile, checksum_bytes};
pub use host::BridgeHost;
pub use id::generate_transfer_id;
pub use reassembler::{
    CompletedTransfer, DecodeFailurePolicy, Outcome, Reassembler, ReassemblerConfig,
};
pub use segmenter::{BlobInfo, Segmenter};
pub use session::{ChunkAcceptance, SessionState, TransferSession};
pub use validation::{MAX_FILENAME_BYTES, sanitize_filename};

/// Idle time after which an unfinished session is evicted.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the host sweeps for abandoned sessions.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("transfer {id} finished with {received} of {total} chunks")]
    Incomplete {
        id: String,
        received: usize,
        total: u32,
    },

    #[error("chunk {index} of transfer {id} could not be decoded")]
    ChunkDecode { id: String, index: u32 },

    #[error("sender abandoned transfer {id}: {message}")]
    SenderFailed { id: String, message: String },

    #[error("blob of {size} bytes needs more chunks than a record can index")]
    TooManyChunks { size: u64 },

    #[error("source for transfer {id} holds more than the announced {size} bytes")]
    SourceOverrun { id: String, size: u64 },

    #[error("channel closed")]
    ChannelClosed,

    #[error("share failed: {0}")]
    Share(String),
}
