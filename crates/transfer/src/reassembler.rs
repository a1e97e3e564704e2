use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use blobbridge_protocol::{ChannelMessage, ChunkRecord, StartRecord, decode_chunk};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::session::{ChunkAcceptance, TransferSession};
use crate::{DEFAULT_SESSION_TIMEOUT, TransferError};

/// What to do with a session when one of its chunks fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeFailurePolicy {
    /// Fail the whole transfer immediately.
    #[default]
    FailSession,
    /// Drop only the bad chunk; the session completes only if the index
    /// is received again intact.
    DropChunk,
}

/// Reassembler tuning.
#[derive(Debug, Clone)]
pub struct ReassemblerConfig {
    pub session_timeout: Duration,
    pub decode_failure: DecodeFailurePolicy,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            decode_failure: DecodeFailurePolicy::default(),
        }
    }
}

/// A fully received blob, ready for the finalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTransfer {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Effect of one channel record on the session table.
#[derive(Debug)]
pub enum Outcome {
    /// The record had no effect (malformed, unknown id, duplicate, out of range).
    Ignored,
    /// A session was opened. `replaced` is set when an unfinished session
    /// with the same id was discarded.
    Started {
        id: String,
        filename: String,
        replaced: bool,
    },
    /// A new chunk was stored.
    Accepted {
        id: String,
        received: usize,
        total: u32,
    },
    /// The transfer finished with every chunk present.
    Completed(CompletedTransfer),
    /// The session was discarded without producing a file.
    Failed { id: String, error: TransferError },
}

/// Owns the live session table and applies channel records to it.
///
/// Handlers may be called from any thread; the table is guarded by a
/// single mutex and no handler holds it across a chunk decode.
pub struct Reassembler {
    sessions: Mutex<HashMap<String, TransferSession>>,
    config: ReassemblerConfig,
}

impl Reassembler {
    pub fn new(config: ReassemblerConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Parses a raw channel record and applies it.
    ///
    /// Malformed records are dropped silently.
    pub fn handle_raw(&self, text: &str) -> Outcome {
        match ChannelMessage::parse(text) {
            Ok(msg) => self.handle(msg),
            Err(e) => {
                debug!(error = %e, "dropping malformed channel record");
                Outcome::Ignored
            }
        }
    }

    /// Applies a parsed channel record.
    pub fn handle(&self, msg: ChannelMessage) -> Outcome {
        match msg {
            ChannelMessage::Start(record) => self.on_start(record),
            ChannelMessage::Chunk(record) => self.on_chunk(record),
            ChannelMessage::Finish(record) => self.on_finish(&record.id),
            ChannelMessage::Error(record) => self.on_error(&record.id, &record.message),
        }
    }

    /// Opens a session, replacing any unfinished session with the same id.
    pub fn on_start(&self, record: StartRecord) -> Outcome {
        if record.id.is_empty() {
            debug!("dropping start record with empty id");
            return Outcome::Ignored;
        }

        let session = TransferSession::new(record, Instant::now());
        let id = session.id().to_string();
        let filename = session.filename().to_string();
        let total = session.total_chunks();

        let replaced = self.sessions().insert(id.clone(), session).is_some();
        if replaced {
            warn!(id = %id, "start record replaced an unfinished transfer");
        }
        info!(id = %id, filename = %filename, total_chunks = total, "transfer started");

        Outcome::Started {
            id,
            filename,
            replaced,
        }
    }

    /// Stores one chunk of an open session.
    pub fn on_chunk(&self, record: ChunkRecord) -> Outcome {
        self.on_chunk_at(record, Instant::now())
    }

    /// [`on_chunk`](Self::on_chunk) with the arrival time given explicitly.
    pub fn on_chunk_at(&self, record: ChunkRecord, now: Instant) -> Outcome {
        // Decoded before the table is locked.
        let decoded = decode_chunk(&record.data);

        let mut sessions = self.sessions();
        if !sessions.contains_key(&record.id) {
            debug!(id = %record.id, index = record.index, "chunk for unknown transfer");
            return Outcome::Ignored;
        }

        let data = match decoded {
            Ok(data) => data,
            Err(e) => match self.config.decode_failure {
                DecodeFailurePolicy::DropChunk => {
                    warn!(
                        id = %record.id,
                        index = record.index,
                        error = %e,
                        "dropping undecodable chunk"
                    );
                    return Outcome::Ignored;
                }
                DecodeFailurePolicy::FailSession => {
                    if let Some(mut session) = sessions.remove(&record.id) {
                        session.fail();
                    }
                    warn!(
                        id = %record.id,
                        index = record.index,
                        error = %e,
                        "transfer failed on undecodable chunk"
                    );
                    return Outcome::Failed {
                        error: TransferError::ChunkDecode {
                            id: record.id.clone(),
                            index: record.index,
                        },
                        id: record.id,
                    };
                }
            },
        };

        let Some(session) = sessions.get_mut(&record.id) else {
            return Outcome::Ignored;
        };

        if record.total_chunks != session.total_chunks() {
            debug!(
                id = %record.id,
                declared = record.total_chunks,
                expected = session.total_chunks(),
                "chunk declares a different total; using the start record's"
            );
        }

        match session.accept(record.index, data, now) {
            ChunkAcceptance::Accepted => Outcome::Accepted {
                id: record.id,
                received: session.received_count(),
                total: session.total_chunks(),
            },
            ChunkAcceptance::Duplicate => {
                session.touch(now);
                debug!(id = %record.id, index = record.index, "duplicate chunk ignored");
                Outcome::Ignored
            }
            ChunkAcceptance::OutOfRange => {
                debug!(
                    id = %record.id,
                    index = record.index,
                    total = session.total_chunks(),
                    "chunk index out of range"
                );
                Outcome::Ignored
            }
        }
    }

    /// Closes a session, yielding the rebuilt blob if every chunk arrived.
    pub fn on_finish(&self, id: &str) -> Outcome {
        let Some(session) = self.sessions().remove(id) else {
            debug!(id = %id, "finish for unknown transfer");
            return Outcome::Ignored;
        };

        let filename = session.filename().to_string();
        let mime_type = session.mime_type().to_string();
        match session.assemble() {
            Ok(bytes) => {
                info!(id = %id, size = bytes.len(), "transfer complete");
                Outcome::Completed(CompletedTransfer {
                    id: id.to_string(),
                    filename,
                    mime_type,
                    bytes,
                })
            }
            Err(error) => {
                warn!(id = %id, error = %error, "finish arrived before all chunks");
                Outcome::Failed {
                    id: id.to_string(),
                    error,
                }
            }
        }
    }

    /// Discards a session the sender abandoned.
    pub fn on_error(&self, id: &str, message: &str) -> Outcome {
        let Some(mut session) = self.sessions().remove(id) else {
            debug!(id = %id, "error for unknown transfer");
            return Outcome::Ignored;
        };
        session.fail();
        warn!(id = %id, message = %message, "sender reported transfer failure");
        Outcome::Failed {
            id: id.to_string(),
            error: TransferError::SenderFailed {
                id: id.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// Evicts sessions idle for longer than the configured timeout.
    ///
    /// Returns the ids of the evicted sessions.
    pub fn evict_expired(&self, now: Instant) -> Vec<String> {
        let timeout = self.config.session_timeout;
        let mut sessions = self.sessions();
        let expired: Vec<String> = sessions
            .values()
            .filter(|s| s.idle_for(now) > timeout)
            .map(|s| s.id().to_string())
            .collect();

        for id in &expired {
            if let Some(session) = sessions.remove(id) {
                debug!(
                    id = %id,
                    received = session.received_count(),
                    total = session.total_chunks(),
                    "evicting abandoned transfer"
                );
            }
        }
        expired
    }

    /// Number of transfers currently in flight.
    pub fn active_sessions(&self) -> usize {
        self.sessions().len()
    }

    /// Returns `true` if a transfer with `id` is in flight.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions().contains_key(id)
    }

    pub fn config(&self) -> &ReassemblerConfig {
        &self.config
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, TransferSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(ReassemblerConfig::default())
    }
}
