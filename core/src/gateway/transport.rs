//! Classifier Transports
//!
//! Abstraction over how classify messages reach the remote classifier:
//! - [`ChannelTransport`]: direct tokio channels for embedded mode and tests
//! - [`FramedTransport`]: framed JSON over any byte stream (socket, pipe) to
//!   an out-of-process classifier
//!
//! A transport is owned entirely by the gateway's I/O task; the gateway
//! itself never touches it directly.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use super::frame::{self, FrameDecoder};
use super::protocol::{ClassifyRequest, ClassifyResponse};

/// Errors from the transport layer
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection to the classifier was closed
    #[error("classifier connection closed")]
    Closed,

    /// Failed to send a message
    #[error("send failed: {0}")]
    Send(String),

    /// Message serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Frame checksum mismatch - data corruption detected
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum carried in the frame header
        expected: u32,
        /// Checksum computed over the received payload
        actual: u32,
    },

    /// IO error from the underlying stream
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Gateway-side transport to a remote classifier
///
/// Implementations deliver requests in send order; responses arrive one at a
/// time in arrival order, which need not match send order.
#[async_trait]
pub trait ClassifierTransport: Send + 'static {
    /// Send a request to the classifier
    async fn send(&mut self, msg: ClassifyRequest) -> Result<(), TransportError>;

    /// Receive the next response (blocks until one arrives)
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the connection is gone.
    async fn recv(&mut self) -> Result<ClassifyResponse, TransportError>;
}

/// In-process transport using tokio channels
///
/// Used when the "remote" classifier runs in the same process (tests,
/// embedded mode). The far side holds the request receiver and response
/// sender and plays the classifier.
pub struct ChannelTransport {
    request_tx: mpsc::Sender<ClassifyRequest>,
    response_rx: mpsc::Receiver<ClassifyResponse>,
}

impl ChannelTransport {
    /// Create a transport pair with the given channel capacity
    ///
    /// Returns the gateway-side transport plus the classifier side's
    /// (request receiver, response sender).
    #[must_use]
    pub fn new_pair(
        capacity: usize,
    ) -> (
        Self,
        mpsc::Receiver<ClassifyRequest>,
        mpsc::Sender<ClassifyResponse>,
    ) {
        let (request_tx, request_rx) = mpsc::channel(capacity);
        let (response_tx, response_rx) = mpsc::channel(capacity);
        (
            Self {
                request_tx,
                response_rx,
            },
            request_rx,
            response_tx,
        )
    }
}

#[async_trait]
impl ClassifierTransport for ChannelTransport {
    async fn send(&mut self, msg: ClassifyRequest) -> Result<(), TransportError> {
        self.request_tx
            .send(msg)
            .await
            .map_err(|_| TransportError::Send("channel closed".to_string()))
    }

    async fn recv(&mut self) -> Result<ClassifyResponse, TransportError> {
        self.response_rx.recv().await.ok_or(TransportError::Closed)
    }
}

/// Framed transport over an arbitrary byte stream
///
/// Wraps the stream with the frame protocol from [`frame`]: each message is
/// one length-prefixed, checksummed JSON frame.
pub struct FramedTransport<S> {
    stream: S,
    decoder: FrameDecoder,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap a connected byte stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::new(),
        }
    }
}

#[async_trait]
impl<S> ClassifierTransport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, msg: ClassifyRequest) -> Result<(), TransportError> {
        let bytes = frame::encode(&msg)?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<ClassifyResponse, TransportError> {
        let mut buf = [0u8; 4096];
        loop {
            if let Some(msg) = self.decoder.decode()? {
                return Ok(msg);
            }
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            self.decoder.push(&buf[..n]);
        }
    }
}
