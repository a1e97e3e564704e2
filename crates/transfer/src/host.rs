//! Host-side driver that feeds channel records into the reassembler.
//!
//! Records are applied one at a time in arrival order. Completed blobs
//! are staged and shared in spawned tasks so a slow disk never holds up
//! chunks of other transfers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::BridgeEvent;
use crate::finalizer::{Finalizer, ShareFacility, StagedFile};
use crate::reassembler::{CompletedTransfer, Outcome, Reassembler};
use crate::{DEFAULT_SWEEP_INTERVAL, TransferError};

/// Receives channel records and turns completed transfers into shared files.
pub struct BridgeHost {
    reassembler: Arc<Reassembler>,
    finalizer: Arc<Finalizer>,
    share: Arc<dyn ShareFacility>,
    events: mpsc::UnboundedSender<BridgeEvent>,
    sweep_interval: Duration,
}

impl BridgeHost {
    pub fn new(
        reassembler: Arc<Reassembler>,
        finalizer: Arc<Finalizer>,
        share: Arc<dyn ShareFacility>,
        events: mpsc::UnboundedSender<BridgeEvent>,
    ) -> Self {
        Self {
            reassembler,
            finalizer,
            share,
            events,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Sets how often abandoned sessions are swept.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn reassembler(&self) -> &Arc<Reassembler> {
        &self.reassembler
    }

    /// Processes records from `rx` until the channel closes or `cancel` fires.
    ///
    /// Pending stage-and-share tasks are awaited before returning.
    pub async fn run(&self, mut rx: mpsc::Receiver<String>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pending: JoinSet<()> = JoinSet::new();

        info!("bridge host running");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("bridge host cancelled");
                    break;
                }
                Some(res) = pending.join_next(), if !pending.is_empty() => {
                    if let Err(e) = res {
                        error!(error = %e, "stage task panicked");
                    }
                }
                _ = ticker.tick() => {
                    self.sweep(Instant::now());
                }
                record = rx.recv() => match record {
                    Some(text) => {
                        let outcome = self.reassembler.handle_raw(&text);
                        self.dispatch(outcome, &mut pending);
                    }
                    None => {
                        debug!("channel closed");
                        break;
                    }
                },
            }
        }

        while let Some(res) = pending.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "stage task panicked");
            }
        }
        info!(
            active = self.reassembler.active_sessions(),
            "bridge host stopped"
        );
    }

    /// Evicts sessions idle past the timeout, as of `now`.
    pub fn sweep(&self, now: Instant) {
        for id in self.reassembler.evict_expired(now) {
            info!(id = %id, "abandoned transfer evicted");
            let _ = self.events.send(BridgeEvent::Expired { id });
        }
    }

    /// Stages `bytes` and hands the file to the share facility, reporting
    /// the result as an event.
    pub async fn stage_and_share(
        &self,
        id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StagedFile, TransferError> {
        stage_and_share(
            &self.finalizer,
            self.share.as_ref(),
            &self.events,
            id,
            filename,
            bytes,
        )
        .await
    }

    /// Reports the start of a transfer that bypasses the channel.
    pub fn announce(&self, id: &str, filename: &str) {
        let _ = self.events.send(BridgeEvent::DownloadStarted {
            id: id.to_string(),
            filename: filename.to_string(),
        });
    }

    /// Reports a failure that happened outside the channel.
    pub fn report_failure(&self, id: &str, reason: &str) {
        warn!(id, reason, "download failed");
        let _ = self.events.send(BridgeEvent::Failed {
            id: id.to_string(),
            reason: reason.to_string(),
        });
    }

    fn dispatch(&self, outcome: Outcome, pending: &mut JoinSet<()>) {
        match outcome {
            Outcome::Ignored | Outcome::Accepted { .. } => {}
            Outcome::Started { id, filename, .. } => self.announce(&id, &filename),
            Outcome::Completed(done) => {
                let finalizer = Arc::clone(&self.finalizer);
                let share = Arc::clone(&self.share);
                let events = self.events.clone();
                pending.spawn(async move {
                    let CompletedTransfer {
                        id,
                        filename,
                        bytes,
                        ..
                    } = done;
                    // Errors are already reported as events.
                    let _ = stage_and_share(
                        &finalizer,
                        share.as_ref(),
                        &events,
                        &id,
                        &filename,
                        &bytes,
                    )
                    .await;
                });
            }
            Outcome::Failed { id, error } => emit_failure(&self.events, id, &error),
        }
    }
}

async fn stage_and_share(
    finalizer: &Finalizer,
    share: &dyn ShareFacility,
    events: &mpsc::UnboundedSender<BridgeEvent>,
    id: &str,
    filename: &str,
    bytes: &[u8],
) -> Result<StagedFile, TransferError> {
    let staged = match finalizer.finalize(filename, bytes).await {
        Ok(staged) => staged,
        Err(e) => {
            emit_failure(events, id.to_string(), &e);
            return Err(e);
        }
    };

    if let Err(e) = share.share(&staged) {
        emit_failure(events, id.to_string(), &e);
        return Err(e);
    }

    info!(id, path = %staged.path.display(), "file handed to share facility");
    let _ = events.send(BridgeEvent::Shared {
        id: id.to_string(),
        path: staged.path.clone(),
    });
    Ok(staged)
}

fn emit_failure(events: &mpsc::UnboundedSender<BridgeEvent>, id: String, error: &TransferError) {
    warn!(id = %id, error = %error, "transfer failed");
    let _ = events.send(BridgeEvent::Failed {
        id,
        reason: error.to_string(),
    });
}
