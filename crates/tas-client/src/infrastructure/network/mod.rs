//! Network infrastructure for the client.
//!
//! Owns the TCP connection to the control module's IPC port.
//!
//! Architecture:
//! - `PayloadConnection` is created unconnected; the first send (or an
//!   explicit [`PayloadConnection::connect`]) opens the socket.
//! - The stream is split into read and write halves, each behind its own
//!   `tokio::sync::Mutex`, so a pending read never blocks a send.
//! - Outbound messages use the `<len><type><payload>` framing and inbound
//!   replies the `<len><payload>` framing from [`tas_core::protocol::codec`].

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tas_core::protocol::codec::{encode_frame, parse_length_prefix, LENGTH_PREFIX_SIZE};
use tas_core::{FrameError, IpcMessage};
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::Mutex,
    time,
};
use tracing::{debug, info};

use crate::application::send_script::PayloadTransport;

/// Largest reply the client is willing to buffer.
pub const MAX_REPLY_SIZE: usize = 16 * 1024 * 1024;

/// Errors that can occur in the client network layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connection to the control module failed.
    #[error("failed to connect to control module at {addr}: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The control module did not accept the connection in time.
    #[error("timed out after {after:?} connecting to control module at {addr}")]
    Timeout { addr: SocketAddr, after: Duration },
    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A message could not be framed or unframed.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),
    /// A reply announced more bytes than [`MAX_REPLY_SIZE`].
    #[error("reply of {0} bytes exceeds the 16 MiB limit")]
    ReplyTooLarge(usize),
    /// A receive was attempted before any connection was made.
    #[error("not connected")]
    NotConnected,
    /// The connection was closed by the remote side.
    #[error("connection closed by control module")]
    Closed,
}

/// Manages the TCP connection from the client to the control module.
pub struct PayloadConnection {
    addr: SocketAddr,
    connect_timeout: Duration,
    reader: Mutex<Option<OwnedReadHalf>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
}

impl PayloadConnection {
    /// Creates a new (not yet connected) `PayloadConnection`.
    pub fn new(addr: SocketAddr, connect_timeout: Duration) -> Self {
        Self {
            addr,
            connect_timeout,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
        }
    }

    /// Address this connection targets.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Opens the socket if it is not open yet.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectFailed`] or
    /// [`TransportError::Timeout`].
    pub async fn connect(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        if writer.is_some() {
            return Ok(());
        }

        let stream = match time::timeout(self.connect_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(TransportError::ConnectFailed {
                    addr: self.addr,
                    source,
                })
            }
            Err(_) => {
                return Err(TransportError::Timeout {
                    addr: self.addr,
                    after: self.connect_timeout,
                })
            }
        };
        stream.set_nodelay(true)?;

        let (read_half, write_half) = stream.into_split();
        *self.reader.lock().await = Some(read_half);
        *writer = Some(write_half);
        info!("connected to control module at {}", self.addr);
        Ok(())
    }

    /// Frames and sends one message, connecting first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if connecting, framing, or writing fails.
    pub async fn send_message(&self, msg: &IpcMessage) -> Result<(), TransportError> {
        let frame = encode_frame(msg)?;
        self.connect().await?;

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(TransportError::NotConnected)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        debug!(
            "sent {:?} frame ({} bytes) to {}",
            msg.message_type(),
            frame.len(),
            self.addr
        );
        Ok(())
    }

    /// Reads one `<len><payload>` reply.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] on EOF, [`TransportError::Frame`]
    /// for a negative length, and [`TransportError::ReplyTooLarge`] for an
    /// oversized one.
    pub async fn receive_reply(&self) -> Result<Vec<u8>, TransportError> {
        let mut guard = self.reader.lock().await;
        let reader = guard.as_mut().ok_or(TransportError::NotConnected)?;

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        read_exact_or_closed(reader, &mut prefix).await?;
        let len = parse_length_prefix(prefix)?;
        if len > MAX_REPLY_SIZE {
            return Err(TransportError::ReplyTooLarge(len));
        }

        let mut payload = vec![0u8; len];
        read_exact_or_closed(reader, &mut payload).await?;
        debug!("received reply ({len} bytes) from {}", self.addr);
        Ok(payload)
    }

    /// Shuts the write half down and drops both halves.
    pub async fn close(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("shutdown of connection to {} failed: {e}", self.addr);
            }
        }
        self.reader.lock().await.take();
    }
}

#[async_trait]
impl PayloadTransport for PayloadConnection {
    async fn send(&self, msg: &IpcMessage) -> Result<(), String> {
        self.send_message(msg).await.map_err(|e| e.to_string())
    }

    async fn receive(&self) -> Result<Vec<u8>, String> {
        self.receive_reply().await.map_err(|e| e.to_string())
    }
}

async fn read_exact_or_closed(
    reader: &mut OwnedReadHalf,
    buf: &mut [u8],
) -> Result<(), TransportError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(TransportError::Closed),
        Err(e) => Err(TransportError::Io(e)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
