use crate::transfer::TransferError;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Payload bytes per chunk frame.
pub const CHUNK_SIZE: usize = 16384;

/// Largest payload a receiver will accept.
pub const MAX_PAYLOAD: u64 = 512 * 1024 * 1024;

/// Text prefix marking the metadata frame.
pub const META_PREFIX: &str = "meta:";

/// Pause between the metadata frame and the first chunk.
pub const FIRST_CHUNK_DELAY: Duration = Duration::from_millis(100);

/// Pause between consecutive chunks.
pub const CHUNK_INTERVAL: Duration = Duration::from_millis(10);

const INDEX_LEN: usize = 4;

fn default_chunk_size() -> u32 {
    CHUNK_SIZE as u32
}

/// Declared shape of a payload, sent ahead of its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMeta {
    pub name: String,
    pub content_type: String,
    pub byte_size: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,
}

impl TransferMeta {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, byte_size: u64) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            byte_size,
            chunk_size: default_chunk_size(),
        }
    }

    pub fn chunk_count(&self) -> u64 {
        if self.chunk_size == 0 {
            return 0;
        }
        self.byte_size.div_ceil(u64::from(self.chunk_size))
    }

    /// Exact payload length expected at `index`, or `None` past the end.
    pub fn expected_len(&self, index: u32) -> Option<usize> {
        let index = u64::from(index);
        if index >= self.chunk_count() {
            return None;
        }
        let start = index * u64::from(self.chunk_size);
        let len = (self.byte_size - start).min(u64::from(self.chunk_size));
        usize::try_from(len).ok()
    }
}

/// One message on a peer data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Meta(TransferMeta),
    Chunk { index: u32, payload: Bytes },
}

impl Frame {
    /// Metadata frames are UTF-8 text; chunks are a big-endian index
    /// followed by raw payload.
    pub fn encode(&self) -> Result<Bytes, TransferError> {
        match self {
            Frame::Meta(meta) => {
                let json = serde_json::to_string(meta)
                    .map_err(|e| TransferError::Malformed(e.to_string()))?;
                Ok(Bytes::from(format!("{}{}", META_PREFIX, json)))
            }
            Frame::Chunk { index, payload } => {
                let mut buf = BytesMut::with_capacity(INDEX_LEN + payload.len());
                buf.put_u32(*index);
                buf.put_slice(payload);
                Ok(buf.freeze())
            }
        }
    }

    pub fn decode(data: Bytes) -> Result<Frame, TransferError> {
        if let Some(json) = std::str::from_utf8(&data)
            .ok()
            .and_then(|text| text.strip_prefix(META_PREFIX))
        {
            let meta = serde_json::from_str(json)
                .map_err(|e| TransferError::Malformed(format!("bad metadata: {}", e)))?;
            return Ok(Frame::Meta(meta));
        }

        if data.len() < INDEX_LEN {
            return Err(TransferError::Malformed(format!(
                "chunk frame of {} bytes has no index",
                data.len()
            )));
        }
        let index = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        Ok(Frame::Chunk {
            index,
            payload: data.slice(INDEX_LEN..),
        })
    }
}
