//! Direct downloads for navigations to downloadable files.
//!
//! When the content environment navigates to a URL whose path ends in a
//! known file extension, the host fetches the resource itself and routes
//! it through the same finalizer as chunked transfers. No session state
//! is involved.

mod client;
mod filename;
mod matcher;

pub use client::{DirectDownloader, Download};
pub use filename::{derive_filename, filename_from_disposition, filename_from_url};
pub use matcher::{DEFAULT_EXTENSIONS, DownloadMatcher};

use blobbridge_transfer::TransferError;

/// Errors from direct downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("server returned status {status}")]
    Status { status: u16 },

    #[error(transparent)]
    Transfer(#[from] TransferError),
}
