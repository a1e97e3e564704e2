use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::TransferError;
use crate::validation::sanitize_filename;

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// A reconstructed blob written to the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub size: u64,
    /// SHA-256 hex digest of the staged bytes.
    pub sha256: String,
}

/// Presents a staged file to the user for export.
pub trait ShareFacility: Send + Sync {
    fn share(&self, file: &StagedFile) -> Result<(), TransferError>;
}

/// Writes reconstructed blobs into a private staging directory.
///
/// Concurrent calls are safe: each writes its own partial file, and only
/// the replace-and-rename step is serialized.
pub struct Finalizer {
    staging_dir: PathBuf,
    publish: Mutex<()>,
}

impl Finalizer {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            publish: Mutex::new(()),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Stages `bytes` under the sanitized form of `filename`.
    ///
    /// The data is written to a hidden, uniquely named `.part` sibling
    /// first and renamed into place, so a failed write never leaves a
    /// partial file under the final name. A pre-existing file with the same
    /// name is replaced; of two concurrent calls for one name, the later
    /// rename wins and the file always holds one caller's bytes intact.
    pub async fn finalize(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StagedFile, TransferError> {
        let name = sanitize_filename(filename);
        tokio::fs::create_dir_all(&self.staging_dir).await?;

        let target = self.staging_dir.join(&name);
        let partial = self
            .staging_dir
            .join(format!(".{name}.{:08x}.part", rand::random::<u32>()));

        if let Err(e) = write_partial(&partial, bytes).await {
            discard(&partial).await;
            return Err(e.into());
        }

        let _publish = self.publish.lock().await;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => debug!(path = %target.display(), "replaced existing staged file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                discard(&partial).await;
                return Err(e.into());
            }
        }

        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            discard(&partial).await;
            return Err(e.into());
        }

        let staged = StagedFile {
            path: target,
            size: bytes.len() as u64,
            sha256: checksum_bytes(bytes),
        };
        info!(
            path = %staged.path.display(),
            size = staged.size,
            sha256 = %staged.sha256,
            "blob staged"
        );
        Ok(staged)
    }
}

async fn write_partial(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "could not remove partial file");
        }
    }
}
