//! TLS Setup Module
//!
//! This module wires the server into the rustls ecosystem. All of the hard
//! cryptographic work (handshake, record framing, certificate handling)
//! lives in `rustls`/`tokio-rustls`; what EchoTLS owns is credential
//! loading and the fail-fast policy around it.
//!
//! ## Overview
//!
//! ```text
//! certs/server.crt ──┐
//!                    ├──> build_acceptor ──> TlsAcceptor ──> handshakes
//! certs/server.key ──┘        (rustls ServerConfig,
//!                              no client auth)
//! ```
//!
//! A broken or missing credential file is a startup error. The acceptor is
//! built exactly once, before the listener binds; per-connection handshake
//! failures are the server loop's business, not this module's.

pub mod loader;

// Re-export commonly used types
pub use loader::{build_acceptor, load_certificates, load_private_key, TlsError};
