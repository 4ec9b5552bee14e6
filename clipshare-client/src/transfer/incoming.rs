use crate::transfer::{CHUNK_SIZE, Frame, MAX_PAYLOAD, TransferError, TransferMeta};
use bytes::{Bytes, BytesMut};
use clipshare_core::PeerId;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// A fully reassembled payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPayload {
    pub from: PeerId,
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Stored,
    Duplicate,
    /// Index past the declared end, or a payload of the wrong length.
    Rejected,
}

/// Chunks of one payload, placed by index.
///
/// Slots are filled as chunks arrive; nothing is reserved up front from the
/// sender's declared size.
#[derive(Debug)]
pub struct IncomingTransfer {
    meta: TransferMeta,
    chunks: BTreeMap<u32, Bytes>,
    received_bytes: u64,
}

impl IncomingTransfer {
    /// Rejects metadata with a chunk size outside `1..=CHUNK_SIZE` or a
    /// byte size above [`MAX_PAYLOAD`].
    pub fn new(meta: TransferMeta) -> Result<Self, TransferError> {
        if meta.chunk_size == 0 || meta.chunk_size as usize > CHUNK_SIZE {
            return Err(TransferError::Malformed(format!(
                "chunk size {} out of range",
                meta.chunk_size
            )));
        }
        if meta.byte_size > MAX_PAYLOAD {
            return Err(TransferError::Malformed(format!(
                "payload of {} bytes exceeds {}",
                meta.byte_size, MAX_PAYLOAD
            )));
        }

        Ok(Self {
            meta,
            chunks: BTreeMap::new(),
            received_bytes: 0,
        })
    }

    pub fn meta(&self) -> &TransferMeta {
        &self.meta
    }

    pub fn received_bytes(&self) -> u64 {
        self.received_bytes
    }

    pub fn accept(&mut self, index: u32, payload: Bytes) -> ChunkOutcome {
        let Some(expected) = self.meta.expected_len(index) else {
            return ChunkOutcome::Rejected;
        };
        if payload.len() != expected {
            return ChunkOutcome::Rejected;
        }

        if self.chunks.contains_key(&index) {
            return ChunkOutcome::Duplicate;
        }
        self.received_bytes += payload.len() as u64;
        self.chunks.insert(index, payload);
        ChunkOutcome::Stored
    }

    pub fn is_complete(&self) -> bool {
        self.received_bytes == self.meta.byte_size
            && self.chunks.len() as u64 == self.meta.chunk_count()
    }

    /// Concatenates the chunks in index order.
    pub fn finish(self, from: PeerId) -> ReceivedPayload {
        let mut data = BytesMut::with_capacity(self.received_bytes as usize);
        for chunk in self.chunks.into_values() {
            data.extend_from_slice(&chunk);
        }

        ReceivedPayload {
            from,
            name: self.meta.name,
            content_type: self.meta.content_type,
            data: data.freeze(),
        }
    }
}

/// In-flight incoming transfers, at most one per sender.
#[derive(Debug, Default)]
pub struct Reassembler {
    transfers: HashMap<PeerId, IncomingTransfer>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self, from: &PeerId) -> Option<&IncomingTransfer> {
        self.transfers.get(from)
    }

    /// Feeds one frame from `from`. Returns the payload exactly once, on the
    /// frame that completes it.
    pub fn on_frame(
        &mut self,
        from: PeerId,
        data: Bytes,
    ) -> Result<Option<ReceivedPayload>, TransferError> {
        match Frame::decode(data)? {
            Frame::Meta(meta) => {
                let transfer = IncomingTransfer::new(meta)?;
                info!(
                    "Receiving '{}' ({} bytes) from {}",
                    transfer.meta().name,
                    transfer.meta().byte_size,
                    from
                );
                let (displaced, done) = if transfer.is_complete() {
                    (self.transfers.remove(&from), Some(transfer.finish(from)))
                } else {
                    (self.transfers.insert(from, transfer), None)
                };
                if let Some(old) = displaced {
                    warn!(
                        "New metadata from {} discards '{}' at {}/{} bytes",
                        from,
                        old.meta().name,
                        old.received_bytes(),
                        old.meta().byte_size
                    );
                }
                Ok(done)
            }

            Frame::Chunk { index, payload } => {
                let Some(transfer) = self.transfers.get_mut(&from) else {
                    debug!("Chunk {} from {} without metadata, ignored", index, from);
                    return Ok(None);
                };

                match transfer.accept(index, payload) {
                    ChunkOutcome::Stored => {}
                    ChunkOutcome::Duplicate => {
                        debug!("Duplicate chunk {} from {}", index, from);
                        return Ok(None);
                    }
                    ChunkOutcome::Rejected => {
                        warn!("Rejected chunk {} from {}", index, from);
                        return Ok(None);
                    }
                }

                if !transfer.is_complete() {
                    return Ok(None);
                }
                match self.transfers.remove(&from) {
                    Some(done) => Ok(Some(done.finish(from))),
                    None => Ok(None),
                }
            }
        }
    }

    /// Drops the in-flight transfer from `from`, if any.
    pub fn discard(&mut self, from: &PeerId) -> bool {
        self.transfers.remove(from).is_some()
    }

    pub fn clear(&mut self) {
        self.transfers.clear();
    }
}
