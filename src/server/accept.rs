//! Accept Loop
//!
//! The server proper: bind once, then serve exactly one TLS client at a
//! time until an exchange reports the shutdown verdict.
//!
//! ## State Machine
//!
//! ```text
//!             ┌───────────────────────────────┐
//!             │  non-shutdown exchange,       │
//!             │  accept/handshake/IO failure  │
//!             ▼                               │
//!       ┌───────────┐ ──────────────────────┘
//!       │ LISTENING │
//!       └─────┬─────┘
//!             │ exchange classified as shutdown
//!             ▼
//!       ┌────────────┐
//!       │ TERMINATED │  (listener, acceptor, stats dropped)
//!       └────────────┘
//! ```
//!
//! ## Failure Policy
//!
//! Setup failures (credentials, bind) are fatal and surface from
//! [`Server::bind`] before the loop ever starts. Failures on a live
//! connection (accept, handshake, read, write) abort only that connection:
//! they are logged, counted where useful, and the loop goes straight back
//! to accepting. A failed handshake never reaches the read/write path.

use crate::connection::{handle_connection, ConnectionStats};
use crate::protocol::Verdict;
use crate::tls::{build_acceptor, TlsError};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, warn};

/// Errors that can occur while setting the server up.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be created or bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// TLS credentials could not be loaded or were rejected
    #[error(transparent)]
    Tls(#[from] TlsError),
}

/// A bound, ready-to-run server.
///
/// Owns the listening socket, the TLS acceptor, and the shared statistics.
/// Dropping the server (which [`Server::run`] does on termination) closes
/// the listener and releases everything else with it.
pub struct Server {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    stats: Arc<ConnectionStats>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listener", &self.listener)
            .field("acceptor", &"TlsAcceptor")
            .field("stats", &self.stats)
            .finish()
    }
}

impl Server {
    /// Loads credentials, builds the acceptor, and binds the listener.
    ///
    /// Everything here is fail-fast: a bad certificate, a missing key, or
    /// an unavailable port is an error returned to the caller, never a
    /// condition the loop limps along with.
    ///
    /// # Arguments
    ///
    /// * `addr` - Bind address, e.g. `"0.0.0.0:11111"` (port 0 picks a free
    ///   port, useful in tests)
    /// * `cert_path` - PEM file with the certificate chain
    /// * `key_path` - PEM file with the private key
    pub async fn bind(addr: &str, cert_path: &Path, key_path: &Path) -> Result<Self, ServerError> {
        let acceptor = build_acceptor(cert_path, key_path)?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self {
            listener,
            acceptor,
            stats: Arc::new(ConnectionStats::new()),
        })
    }

    /// Returns the address the listener is actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a handle to the shared connection statistics.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Runs the accept loop until a client issues the shutdown sentinel.
    ///
    /// Connections are served strictly one at a time: the next `accept`
    /// happens only after the current client's exchange and teardown have
    /// finished. Consumes the server, so returning from this method closes
    /// the listening socket.
    pub async fn run(self) {
        loop {
            info!("Waiting for a connection...");

            let (stream, addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let tls_stream = match self.acceptor.accept(stream).await {
                Ok(tls) => tls,
                Err(e) => {
                    self.stats.handshake_failed();
                    warn!(client = %addr, error = %e, "TLS handshake failed");
                    continue;
                }
            };

            match handle_connection(tls_stream, addr, Arc::clone(&self.stats)).await {
                Some(Verdict::Shutdown) => {
                    info!(client = %addr, "Shutdown command issued");
                    break;
                }
                Some(Verdict::Continue) | None => {}
            }
        }

        info!("Listener closing, releasing resources");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FIXED_REPLY;
    use crate::tls::load_certificates;
    use rustls::pki_types::ServerName;
    use rustls::RootCertStore;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;
    use tokio::time::{sleep, Duration};
    use tokio_rustls::client::TlsStream;
    use tokio_rustls::TlsConnector;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("certs")
            .join(name)
    }

    async fn start_test_server() -> (SocketAddr, Arc<ConnectionStats>, JoinHandle<()>) {
        let server = Server::bind("127.0.0.1:0", &fixture("server.crt"), &fixture("server.key"))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let stats = server.stats();
        let handle = tokio::spawn(server.run());
        (addr, stats, handle)
    }

    fn test_connector() -> TlsConnector {
        let mut roots = RootCertStore::empty();
        for cert in load_certificates(&fixture("server.crt")).unwrap() {
            roots.add(cert).unwrap();
        }
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        TlsConnector::from(Arc::new(config))
    }

    async fn tls_connect(addr: SocketAddr) -> TlsStream<TcpStream> {
        let tcp = TcpStream::connect(addr).await.unwrap();
        test_connector()
            .connect(ServerName::try_from("localhost").unwrap(), tcp)
            .await
            .unwrap()
    }

    /// One full client exchange: connect, handshake, send, read to EOF.
    async fn exchange(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
        let mut stream = tls_connect(addr).await;
        stream.write_all(payload).await.unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await.unwrap();
        reply
    }

    #[tokio::test]
    async fn test_fixed_reply_and_server_stays_up() {
        let (addr, stats, _handle) = start_test_server().await;

        assert_eq!(exchange(addr, b"hello").await, FIXED_REPLY);
        // A second client is still served
        assert_eq!(exchange(addr, b"hello again").await, FIXED_REPLY);

        assert_eq!(stats.requests_served.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_shutdown_sentinel_stops_listener() {
        let (addr, _, handle) = start_test_server().await;

        // The shutdown client still gets its reply
        assert_eq!(exchange(addr, b"shutdown now").await, FIXED_REPLY);

        // The loop has returned and the listening socket is gone
        handle.await.unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_handshake_does_not_poison_loop() {
        let (addr, stats, _handle) = start_test_server().await;

        // Not a TLS record; the handshake fails and the socket is dropped
        let mut plain = TcpStream::connect(addr).await.unwrap();
        plain.write_all(b"plainly not a ClientHello").await.unwrap();
        let mut sink = Vec::new();
        let _ = plain.read_to_end(&mut sink).await;

        // The next well-behaved client is served normally
        assert_eq!(exchange(addr, b"hello").await, FIXED_REPLY);
        assert_eq!(stats.handshakes_failed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_clients_served_strictly_in_turn() {
        let (addr, _, _handle) = start_test_server().await;

        // First client handshakes, then stalls before sending its request
        let mut first = tls_connect(addr).await;

        // Second client cannot complete its exchange while the first is
        // being served
        let second = tokio::spawn(async move { exchange(addr, b"hello from the queue").await });
        sleep(Duration::from_millis(100)).await;
        assert!(!second.is_finished());

        // Finish the first exchange; the second then goes through
        first.write_all(b"hello").await.unwrap();
        let mut reply = Vec::new();
        first.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, FIXED_REPLY);

        assert_eq!(second.await.unwrap(), FIXED_REPLY);
    }

    #[tokio::test]
    async fn test_bad_credentials_fail_bind() {
        let err = Server::bind(
            "127.0.0.1:0",
            &fixture("does-not-exist.crt"),
            &fixture("server.key"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServerError::Tls(_)));
    }

    #[tokio::test]
    async fn test_taken_port_fails_bind() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = Server::bind(
            &addr.to_string(),
            &fixture("server.crt"),
            &fixture("server.key"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
