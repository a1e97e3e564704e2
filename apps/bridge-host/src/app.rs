use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use blobbridge_direct_download::{DirectDownloader, DownloadMatcher};
use blobbridge_transfer::{
    BridgeEvent, BridgeHost, Finalizer, NoticeKind, NoticeQueue, Reassembler, ShareFacility,
    StagedFile, TransferError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;

/// Records buffered between stdin and the host loop.
const RECORD_BUFFER: usize = 64;

/// Hands staged files to whatever reads our stdout.
struct PrintShare;

impl ShareFacility for PrintShare {
    fn share(&self, file: &StagedFile) -> Result<(), TransferError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}\t{}", file.path.display(), file.sha256)
            .and_then(|()| out.flush())
            .map_err(|e| TransferError::Share(e.to_string()))
    }
}

/// Runs the host until stdin closes or Ctrl-C is received.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let reassembler = Arc::new(Reassembler::new(config.reassembler_config()));
    let finalizer = Arc::new(Finalizer::new(&config.staging_dir));
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let host = Arc::new(
        BridgeHost::new(reassembler, finalizer, Arc::new(PrintShare), events_tx)
            .with_sweep_interval(config.sweep_interval()),
    );
    let downloader = Arc::new(
        DirectDownloader::new(DownloadMatcher::new(&config.downloadable_extensions))
            .context("failed to build HTTP client")?,
    );

    let notices = tokio::spawn(show_notices(events_rx));

    let cancel = CancellationToken::new();
    let (records_tx, records_rx) = mpsc::channel::<String>(RECORD_BUFFER);
    let host_task = {
        let host = Arc::clone(&host);
        let cancel = cancel.clone();
        tokio::spawn(async move { host.run(records_rx, cancel).await })
    };

    let mut downloads = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                cancel.cancel();
                break;
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "failed to read stdin");
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if line.starts_with("http://") || line.starts_with("https://") {
                    let url = line.to_string();
                    let host = Arc::clone(&host);
                    let downloader = Arc::clone(&downloader);
                    downloads.spawn(async move {
                        match downloader.intercept(&url, &host).await {
                            Ok(Some(_)) => {}
                            Ok(None) => debug!(url = %url, "navigation not downloadable"),
                            // Already reported through the host events.
                            Err(e) => debug!(url = %url, error = %e, "direct download failed"),
                        }
                    });
                } else if records_tx.send(line.to_string()).await.is_err() {
                    warn!("bridge host stopped accepting records");
                    break;
                }
            }
        }
    }

    drop(records_tx);
    while let Some(res) = downloads.join_next().await {
        if let Err(e) = res {
            error!(error = %e, "download task panicked");
        }
    }
    host_task.await.context("bridge host task failed")?;

    // Last event sender goes with the host.
    drop(host);
    notices.await.context("notice task failed")?;
    Ok(())
}

async fn show_notices(mut events: mpsc::UnboundedReceiver<BridgeEvent>) {
    let mut queue = NoticeQueue::new();
    while let Some(event) = events.recv().await {
        let Some(id) = queue.notify(&event) else {
            continue;
        };
        if let Some(notice) = queue.get(id) {
            let message = notice.message.as_deref().unwrap_or_default();
            match notice.kind {
                NoticeKind::Error => error!(title = %notice.title, detail = message, "notice"),
                NoticeKind::Info | NoticeKind::Success => {
                    info!(title = %notice.title, detail = message, "notice")
                }
            }
        }
        queue.remove(id);
    }
}
