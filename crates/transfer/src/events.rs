use std::path::PathBuf;

/// Default notice display duration in milliseconds.
const DEFAULT_DURATION_MS: u64 = 4000;

/// Error notice display duration in milliseconds (longer for visibility).
const ERROR_DURATION_MS: u64 = 6000;

/// Something the bridge host reports to the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// A transfer or direct download began.
    DownloadStarted { id: String, filename: String },
    /// A file was staged and handed to the share facility.
    Shared { id: String, path: PathBuf },
    /// A transfer ended without producing a shared file.
    Failed { id: String, reason: String },
    /// An abandoned session was evicted.
    Expired { id: String },
}

/// The visual category of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A short user-facing notification.
#[derive(Debug, Clone)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub title: String,
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// In-memory notice queue with monotonic ID assignment.
///
/// Dismissal timing belongs to whatever renders the notices.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
    next_id: u64,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a notice. Returns the assigned ID.
    pub fn push(
        &mut self,
        kind: NoticeKind,
        title: impl Into<String>,
        message: Option<String>,
        duration_ms: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notices.push(Notice {
            id,
            kind,
            title: title.into(),
            message,
            duration_ms,
        });
        id
    }

    /// Turns a bridge event into a notice.
    ///
    /// Expired sessions are housekeeping and produce no notice.
    pub fn notify(&mut self, event: &BridgeEvent) -> Option<u64> {
        let id = match event {
            BridgeEvent::DownloadStarted { filename, .. } => self.push(
                NoticeKind::Info,
                "Download started",
                Some(filename.clone()),
                DEFAULT_DURATION_MS,
            ),
            BridgeEvent::Shared { path, .. } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.push(
                    NoticeKind::Success,
                    "Ready to share",
                    Some(name),
                    DEFAULT_DURATION_MS,
                )
            }
            BridgeEvent::Failed { reason, .. } => self.push(
                NoticeKind::Error,
                "Download failed",
                Some(reason.clone()),
                ERROR_DURATION_MS,
            ),
            BridgeEvent::Expired { .. } => return None,
        };
        Some(id)
    }

    /// Remove a notice by ID. Returns `true` if found and removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let len_before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != len_before
    }

    /// Look up a notice by ID.
    pub fn get(&self, id: u64) -> Option<&Notice> {
        self.notices.iter().find(|n| n.id == id)
    }
}
