//! # EchoTLS - A Minimal One-Client-at-a-Time TLS Request/Response Server
//!
//! EchoTLS is a deliberately small TLS server written in Rust. It accepts
//! one TCP client at a time, upgrades the connection to TLS, performs a
//! single request/response exchange, and terminates cleanly when a client's
//! payload begins with the shutdown sentinel.
//!
//! ## Features
//!
//! - **One Client at a Time**: Strictly sequential service; the next client
//!   is accepted only after the current one is fully torn down
//! - **TLS via rustls**: Handshake, record layer, and certificate handling
//!   are delegated to `rustls`/`tokio-rustls`
//! - **Fail-Fast Setup**: Bad credentials or an unavailable port abort
//!   startup; a failed handshake or exchange aborts only that connection
//! - **Remote Shutdown**: A payload starting with the 8 ASCII bytes
//!   `shutdown` stops the server after it sends its reply
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                             EchoTLS                                │
//! │                                                                    │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐             │
//! │  │ TCP Server  │───>│    TLS      │───>│ Connection  │             │
//! │  │ (Listener)  │    │ Handshake   │    │  Handler    │             │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘             │
//! │        ▲                                      │                    │
//! │        │                                      ▼                    │
//! │        │                              ┌─────────────┐              │
//! │        │        Verdict::Continue     │  classify   │              │
//! │        └──────────────────────────────┤  payload    │              │
//! │                                       └──────┬──────┘              │
//! │                                              │ Verdict::Shutdown   │
//! │                                              ▼                     │
//! │                                       ┌─────────────┐              │
//! │                                       │ TERMINATED  │              │
//! │                                       └─────────────┘              │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use echotls::server::Server;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::bind(
//!         "0.0.0.0:11111",
//!         Path::new("certs/server.crt"),
//!         Path::new("certs/server.key"),
//!     )
//!     .await
//!     .unwrap();
//!
//!     // Serves clients until one sends "shutdown"
//!     server.run().await;
//! }
//! ```
//!
//! ## The Exchange
//!
//! Every connection follows the same script:
//!
//! 1. TLS handshake (server certificate only, no client auth)
//! 2. The server reads at most one buffer (256 bytes) of payload
//! 3. The server replies with the fixed literal `I hear ya fa shizzle!`
//! 4. close_notify, socket teardown, next client
//!
//! The reply never depends on the request. The only interpreted payload is
//! the shutdown sentinel at the start of a request.
//!
//! ## Module Overview
//!
//! - [`protocol`]: Sentinel and reply constants, payload classification
//! - [`tls`]: PEM credential loading and acceptor construction
//! - [`connection`]: The single request/response exchange
//! - [`server`]: The bind + sequential accept loop
//!
//! ## Design Highlights
//!
//! ### Sequential Service
//!
//! There is no per-connection task. The accept loop awaits the whole
//! handshake-exchange-teardown sequence before calling `accept` again, so
//! at most one TLS session exists at any moment and nothing is shared
//! across concurrent execution.
//!
//! ### Fail-Fast Error Policy
//!
//! Setup errors (certificate, key, bind) surface before the loop starts and
//! stop the process. Per-connection errors (accept, handshake, read, write)
//! are logged and abort only that connection; an invalid session handle is
//! never carried into a later call.
//!
//! ### External Credentials
//!
//! The certificate and key are read from PEM files at startup, never
//! compiled into the binary. The repository ships a self-signed pair under
//! `certs/` for demonstration and tests.

pub mod connection;
pub mod protocol;
pub mod server;
pub mod tls;

// Re-export commonly used types for convenience
pub use connection::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
pub use protocol::{classify, Verdict, FIXED_REPLY, MAX_REQUEST_SIZE, SHUTDOWN_SENTINEL};
pub use server::{Server, ServerError};
pub use tls::{build_acceptor, load_certificates, load_private_key, TlsError};

/// The default port EchoTLS listens on
pub const DEFAULT_PORT: u16 = 11111;

/// The default host EchoTLS binds to (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default path of the PEM certificate chain
pub const DEFAULT_CERT_PATH: &str = "certs/server.crt";

/// Default path of the PEM private key
pub const DEFAULT_KEY_PATH: &str = "certs/server.key";

/// Version of EchoTLS
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
