//! Frame Protocol
//!
//! Wire format for classify messages crossing a process boundary:
//! length-prefixed JSON with a CRC32 checksum.
//!
//! # Frame Format
//!
//! ```text
//! +----------------+----------------+------------------------------------------+
//! | Length (4)     | Checksum (4)   | JSON Payload (variable)                  |
//! | big-endian u32 | CRC32          | ClassifyRequest or ClassifyResponse     |
//! +----------------+----------------+------------------------------------------+
//! ```
//!
//! The length field covers the JSON payload only. The length is validated
//! before any buffer is allocated, and the checksum detects corruption in
//! transit.

use serde::{de::DeserializeOwned, Serialize};

use super::transport::TransportError;

/// Maximum frame size (1 MB)
///
/// Classification payloads are small; anything larger is corruption or abuse.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Frame header size: 4 bytes length + 4 bytes checksum
const HEADER_SIZE: usize = 8;

/// Encode a message to a length-prefixed, checksummed frame
///
/// # Errors
///
/// Returns [`TransportError::Serialization`] if serialization fails or the
/// payload exceeds [`MAX_FRAME_SIZE`].
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, TransportError> {
    let json = serde_json::to_vec(msg).map_err(|e| TransportError::Serialization(e.to_string()))?;

    if json.len() > MAX_FRAME_SIZE {
        return Err(TransportError::Serialization(format!(
            "frame too large: {} bytes (max {MAX_FRAME_SIZE})",
            json.len()
        )));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + json.len());
    buf.extend_from_slice(&(json.len() as u32).to_be_bytes());
    buf.extend_from_slice(&crc32fast::hash(&json).to_be_bytes());
    buf.extend_from_slice(&json);
    Ok(buf)
}

/// Streaming frame parser
///
/// Buffers incoming bytes and yields complete messages as they become
/// available; partial frames simply wait for more data.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes to the buffer
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next complete frame
    ///
    /// Returns `Ok(None)` when more data is needed.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ChecksumMismatch`] on corruption, or
    /// [`TransportError::Serialization`] for oversized or malformed frames.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<Option<T>, TransportError> {
        if self.buffer.len() < HEADER_SIZE {
            return Ok(None);
        }

        let len = u32::from_be_bytes([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
        ]) as usize;

        if len > MAX_FRAME_SIZE {
            return Err(TransportError::Serialization(format!(
                "frame size {len} exceeds maximum {MAX_FRAME_SIZE}"
            )));
        }

        if self.buffer.len() < HEADER_SIZE + len {
            return Ok(None);
        }

        let expected = u32::from_be_bytes([
            self.buffer[4],
            self.buffer[5],
            self.buffer[6],
            self.buffer[7],
        ]);

        let payload = &self.buffer[HEADER_SIZE..HEADER_SIZE + len];
        let actual = crc32fast::hash(payload);
        if actual != expected {
            return Err(TransportError::ChecksumMismatch { expected, actual });
        }

        let msg = serde_json::from_slice(payload)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        self.buffer.drain(..HEADER_SIZE + len);
        Ok(Some(msg))
    }
}
