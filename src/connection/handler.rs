//! Connection Handler Module
//!
//! This module performs the one request/response exchange EchoTLS grants
//! each client. The handler is created by the accept loop after the TLS
//! handshake has already succeeded, so a broken handshake can never reach
//! the read/write path.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP + TLS handshake, done by the server loop)
//!        │
//!        ▼
//! 2. ConnectionHandler created
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │     Single Exchange          │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read once (≤ 256 bytes) │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Classify payload        │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Send fixed reply        │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ close_notify + drop     │ │
//!    │  └─────────────────────────┘ │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Verdict returned to the server loop
//! ```
//!
//! ## Buffer Management
//!
//! Unlike a stream protocol with framing, this exchange reads at most one
//! buffer's worth of data. The BytesMut buffer is capacity-bounded at
//! `MAX_REQUEST_SIZE`, so a single `read_buf` can never pull in more.

use crate::protocol::{classify, Verdict, FIXED_REPLY, MAX_REQUEST_SIZE};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of TLS clients served or attempted after handshake
    pub connections_accepted: AtomicU64,
    /// Currently active connections (0 or 1 by construction)
    pub active_connections: AtomicU64,
    /// Handshakes that failed before a handler was created
    pub handshakes_failed: AtomicU64,
    /// Total exchanges that got their reply out
    pub requests_served: AtomicU64,
    /// Total payload bytes read
    pub bytes_read: AtomicU64,
    /// Total reply bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn handshake_failed(&self) {
        self.handshakes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_served(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// The handler owns the encrypted stream for the duration of the exchange
/// and drops it at the end, which closes the underlying socket. It is
/// generic over the stream type so tests can drive it with in-memory I/O
/// instead of a real TLS session.
pub struct ConnectionHandler<S> {
    /// The encrypted stream for this connection
    stream: S,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for the request payload, capacity-bounded
    buffer: BytesMut,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The encrypted stream for this connection
    /// * `addr` - The client's socket address
    /// * `stats` - Shared connection statistics
    pub fn new(stream: S, addr: SocketAddr, stats: Arc<ConnectionStats>) -> Self {
        stats.connection_opened();

        Self {
            stream,
            addr,
            buffer: BytesMut::with_capacity(MAX_REQUEST_SIZE),
            stats,
        }
    }

    /// Runs the exchange to completion.
    ///
    /// Reads the request, sends the fixed reply, and returns the verdict
    /// that tells the server loop whether to keep listening.
    pub async fn run(mut self) -> Result<Verdict, ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.exchange().await;

        match &result {
            Ok(verdict) => info!(client = %self.addr, verdict = %verdict, "Exchange complete"),
            Err(e) => match e {
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Exchange failed"),
            },
        }

        self.stats.connection_closed();
        result
    }

    /// The single read-classify-reply exchange.
    async fn exchange(&mut self) -> Result<Verdict, ConnectionError> {
        // One read, at most MAX_REQUEST_SIZE bytes. No framing, no loop.
        let n = self.stream.read_buf(&mut self.buffer).await?;
        self.stats.bytes_read(n);

        debug!(
            client = %self.addr,
            bytes = n,
            payload = %String::from_utf8_lossy(&self.buffer),
            "Request received"
        );

        // A zero-byte read means the client closed without sending.
        // The reply still goes out: the response never depends on the
        // request content.
        let verdict = classify(&self.buffer);

        self.stream.write_all(FIXED_REPLY).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(FIXED_REPLY.len());
        self.stats.request_served();

        // Send close_notify so the client sees a clean TLS EOF. The reply
        // is already flushed, so a peer that hung up early does not void
        // the verdict.
        if let Err(e) = self.stream.shutdown().await {
            debug!(client = %self.addr, error = %e, "Stream shutdown after reply failed");
        }

        Ok(verdict)
    }
}

/// Errors that can occur while handling a connection.
///
/// These abort only the current connection; the server returns to
/// listening afterwards.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error on the encrypted stream (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler and
/// runs it to completion. A failed exchange maps to `None`; the error has
/// already been logged by the handler.
///
/// # Arguments
///
/// * `stream` - The encrypted stream for this connection
/// * `addr` - The client's socket address
/// * `stats` - Shared connection statistics
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    stats: Arc<ConnectionStats>,
) -> Option<Verdict>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, stats);
    match handler.run().await {
        Ok(verdict) => Some(verdict),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    fn test_addr() -> SocketAddr {
        "127.0.0.1:4433".parse().unwrap()
    }

    #[tokio::test]
    async fn test_plain_request_gets_fixed_reply() {
        let stream = tokio_test::io::Builder::new()
            .read(b"hello")
            .write(FIXED_REPLY)
            .build();
        let stats = Arc::new(ConnectionStats::new());

        let handler = ConnectionHandler::new(stream, test_addr(), stats);
        let verdict = handler.run().await.unwrap();

        assert_eq!(verdict, Verdict::Continue);
    }

    #[tokio::test]
    async fn test_shutdown_sentinel_flips_verdict() {
        let stream = tokio_test::io::Builder::new()
            .read(b"shutdown now")
            .write(FIXED_REPLY)
            .build();
        let stats = Arc::new(ConnectionStats::new());

        let handler = ConnectionHandler::new(stream, test_addr(), stats);
        let verdict = handler.run().await.unwrap();

        assert_eq!(verdict, Verdict::Shutdown);
    }

    #[tokio::test]
    async fn test_empty_payload_still_gets_reply() {
        let (mut client, server_side) = duplex(MAX_REQUEST_SIZE);
        let stats = Arc::new(ConnectionStats::new());

        let task = tokio::spawn(handle_connection(server_side, test_addr(), stats));

        // Close without sending anything
        client.shutdown().await.unwrap();

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, FIXED_REPLY);

        assert_eq!(task.await.unwrap(), Some(Verdict::Continue));
    }

    #[tokio::test]
    async fn test_stats_track_one_exchange() {
        let (mut client, server_side) = duplex(1024);
        let stats = Arc::new(ConnectionStats::new());

        let task = tokio::spawn(handle_connection(
            server_side,
            test_addr(),
            Arc::clone(&stats),
        ));

        client.write_all(b"hello").await.unwrap();

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, FIXED_REPLY);

        task.await.unwrap();

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
        assert_eq!(stats.requests_served.load(Ordering::Relaxed), 1);
        assert_eq!(stats.bytes_read.load(Ordering::Relaxed), 5);
        assert_eq!(
            stats.bytes_written.load(Ordering::Relaxed),
            FIXED_REPLY.len() as u64
        );
    }

    #[tokio::test]
    async fn test_oversized_payload_read_is_capped() {
        let (mut client, server_side) = duplex(1024);
        let stats = Arc::new(ConnectionStats::new());

        let task = tokio::spawn(handle_connection(
            server_side,
            test_addr(),
            Arc::clone(&stats),
        ));

        // More than one buffer's worth; only MAX_REQUEST_SIZE is read
        client.write_all(&[b'a'; 300]).await.unwrap();

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, FIXED_REPLY);

        assert_eq!(task.await.unwrap(), Some(Verdict::Continue));
        assert_eq!(
            stats.bytes_read.load(Ordering::Relaxed),
            MAX_REQUEST_SIZE as u64
        );
    }
}
