use crate::link::LinkHandle;
use crate::transfer::{
    CHUNK_INTERVAL, CHUNK_SIZE, FIRST_CHUNK_DELAY, Frame, TransferError, TransferMeta,
};
use crate::transport::PeerTransport;
use bytes::Bytes;
use clipshare_core::PeerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A Connected link captured when a send starts.
#[derive(Clone)]
pub struct TransferTarget {
    pub handle: LinkHandle,
    pub transport: Arc<dyn PeerTransport>,
    /// Fired when the link is torn down.
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendProgress {
    pub sent: u64,
    pub total: u64,
}

impl SendProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.sent as f64 / self.total as f64
    }

    pub fn is_done(&self) -> bool {
        self.sent >= self.total
    }
}

/// How a send ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReport {
    /// Peers that got every frame.
    pub delivered: Vec<PeerId>,
    /// Peers dropped along the way, by delivery failure or link teardown.
    pub dropped: Vec<PeerId>,
    pub cancelled: bool,
}

pub struct SendHandle {
    progress: watch::Receiver<SendProgress>,
    cancel: CancellationToken,
    task: JoinHandle<SendReport>,
}

impl SendHandle {
    pub fn progress(&self) -> watch::Receiver<SendProgress> {
        self.progress.clone()
    }

    /// Stops the send before its next chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn finished(self) -> SendReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) => {
                warn!("Sender task ended abnormally: {}", e);
                SendReport {
                    cancelled: true,
                    ..SendReport::default()
                }
            }
        }
    }
}

/// One paced send of one payload to a fixed set of links.
pub struct OutgoingTransfer {
    meta: TransferMeta,
    data: Bytes,
    offset: usize,
    targets: Vec<TransferTarget>,
    dropped: Vec<PeerId>,
    progress: watch::Sender<SendProgress>,
    cancel: CancellationToken,
}

impl OutgoingTransfer {
    /// Spawns the paced sender. Fails if there is nobody to send to.
    pub fn start(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
        targets: Vec<TransferTarget>,
    ) -> Result<SendHandle, TransferError> {
        if targets.is_empty() {
            return Err(TransferError::TargetUnavailable);
        }

        let meta = TransferMeta::new(name, content_type, data.len() as u64);
        let (progress, progress_rx) = watch::channel(SendProgress {
            sent: 0,
            total: meta.byte_size,
        });
        let cancel = CancellationToken::new();

        let transfer = Self {
            meta,
            data,
            offset: 0,
            targets,
            dropped: Vec::new(),
            progress,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(transfer.run());

        Ok(SendHandle {
            progress: progress_rx,
            cancel,
            task,
        })
    }

    async fn run(mut self) -> SendReport {
        info!(
            "Sending '{}' ({} bytes) to {} peer(s)",
            self.meta.name,
            self.meta.byte_size,
            self.targets.len()
        );

        match Frame::Meta(self.meta.clone()).encode() {
            Ok(frame) => self.emit(frame).await,
            Err(e) => {
                warn!("Could not encode metadata: {}", e);
                return self.report(true);
            }
        }

        let mut index: u32 = 0;
        let mut delay = FIRST_CHUNK_DELAY;

        while self.offset < self.data.len() {
            if self.targets.is_empty() {
                warn!("Every target dropped out of '{}'", self.meta.name);
                break;
            }
            if !self.pause(delay).await {
                debug!("Send of '{}' cancelled at {}", self.meta.name, self.offset);
                return self.report(true);
            }
            delay = CHUNK_INTERVAL;

            let end = (self.offset + CHUNK_SIZE).min(self.data.len());
            let payload = self.data.slice(self.offset..end);
            match (Frame::Chunk { index, payload }).encode() {
                Ok(frame) => self.emit(frame).await,
                Err(e) => {
                    warn!("Could not encode chunk {}: {}", index, e);
                    return self.report(true);
                }
            }

            self.offset = end;
            index += 1;
            self.progress.send_replace(SendProgress {
                sent: self.offset as u64,
                total: self.meta.byte_size,
            });
        }

        self.report(false)
    }

    /// Waits `delay` unless the send is cancelled first.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => !self.cancel.is_cancelled(),
        }
    }

    /// Sends `frame` to every remaining target, dropping the ones that fail.
    async fn emit(&mut self, frame: Bytes) {
        let targets = std::mem::take(&mut self.targets);

        for target in targets {
            let peer = target.handle.remote;
            if target.cancel.is_cancelled() {
                debug!("Link {} closed, leaving it out", target.handle);
                self.dropped.push(peer);
                continue;
            }

            match target.transport.send(frame.clone()).await {
                Ok(()) => self.targets.push(target),
                Err(e) => {
                    let err = TransferError::ChunkDelivery {
                        peer,
                        reason: e.to_string(),
                    };
                    warn!("{}", err);
                    self.dropped.push(peer);
                }
            }
        }
    }

    fn report(self, cancelled: bool) -> SendReport {
        SendReport {
            delivered: if cancelled {
                Vec::new()
            } else {
                self.targets.iter().map(|t| t.handle.remote).collect()
            },
            dropped: self.dropped,
            cancelled,
        }
    }
}
