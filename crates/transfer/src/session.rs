use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use blobbridge_protocol::StartRecord;

use crate::TransferError;

/// Lifecycle state of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Started,
    Receiving,
    Completed,
    Failed,
}

/// Result of offering a chunk to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkAcceptance {
    Accepted,
    Duplicate,
    OutOfRange,
}

/// Host-side state for one blob in flight.
///
/// Chunks are keyed by index, never appended on arrival, so the rebuilt
/// blob does not depend on the order the channel delivered them in.
#[derive(Debug)]
pub struct TransferSession {
    id: String,
    filename: String,
    mime_type: String,
    size: u64,
    total_chunks: u32,
    received: HashSet<u32>,
    chunks: HashMap<u32, Vec<u8>>,
    state: SessionState,
    last_activity: Instant,
}

impl TransferSession {
    /// Creates a session from a `start` record.
    ///
    /// A declared chunk count of 0 is clamped to 1.
    pub fn new(record: StartRecord, now: Instant) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            mime_type: record.mime_type,
            size: record.size,
            total_chunks: record.total_chunks.max(1),
            received: HashSet::new(),
            chunks: HashMap::new(),
            state: SessionState::Started,
            last_activity: now,
        }
    }

    /// Stores a decoded chunk unless the index is a duplicate or outside
    /// `[0, total_chunks)`.
    pub fn accept(&mut self, index: u32, data: Vec<u8>, now: Instant) -> ChunkAcceptance {
        if index >= self.total_chunks {
            return ChunkAcceptance::OutOfRange;
        }
        if !self.received.insert(index) {
            return ChunkAcceptance::Duplicate;
        }
        self.chunks.insert(index, data);
        self.state = SessionState::Receiving;
        self.last_activity = now;
        ChunkAcceptance::Accepted
    }

    /// Refreshes the activity timestamp without storing anything.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Returns `true` once every index in `[0, total_chunks)` was received.
    pub fn is_complete(&self) -> bool {
        self.received.len() == self.total_chunks as usize
    }

    /// Concatenates the chunks by ascending index.
    ///
    /// Consumes the session; the state is set to `Completed` on success and
    /// `Failed` if any index is missing.
    pub fn assemble(mut self) -> Result<Vec<u8>, TransferError> {
        if !self.is_complete() {
            self.state = SessionState::Failed;
            return Err(self.incomplete_error());
        }

        let total_len: usize = self.chunks.values().map(Vec::len).sum();
        let mut out = Vec::with_capacity(total_len);
        for index in 0..self.total_chunks {
            match self.chunks.remove(&index) {
                Some(chunk) => out.extend_from_slice(&chunk),
                None => {
                    self.state = SessionState::Failed;
                    return Err(self.incomplete_error());
                }
            }
        }
        self.state = SessionState::Completed;
        Ok(out)
    }

    /// Marks the session failed and releases its buffered chunks.
    pub fn fail(&mut self) {
        self.state = SessionState::Failed;
        self.chunks.clear();
        self.received.clear();
    }

    pub(crate) fn incomplete_error(&self) -> TransferError {
        TransferError::Incomplete {
            id: self.id.clone(),
            received: self.received.len(),
            total: self.total_chunks,
        }
    }

    /// Time since the last accepted record.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Advisory blob size declared by the sender.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    pub fn received_count(&self) -> usize {
        self.received.len()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}
