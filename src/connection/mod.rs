//! Connection Handler Module
//!
//! This module manages the single client connection EchoTLS serves at a
//! time. There is no per-connection task: the server loop awaits the whole
//! exchange before accepting the next client, so at most one handler ever
//! exists.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                  (server module)                            │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept() + TLS handshake
//!                        ▼
//!           ┌────────────────────────┐
//!           │  One client at a time  │
//!           └────────────┬───────────┘
//!                        │
//!                        │ await to completion
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read once   │───>│ Classify    │───>│ Send reply  │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │  Verdict    │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Async I/O**: Uses Tokio for the read and write on the TLS stream
//! - **Bounded Read**: A capacity-bounded BytesMut caps the request at one
//!   buffer
//! - **Stream-Generic**: The handler works on any `AsyncRead + AsyncWrite`,
//!   so tests can use in-memory streams
//! - **Statistics**: Tracks connection and exchange metrics
//!
//! ## Example
//!
//! ```ignore
//! use echotls::connection::{handle_connection, ConnectionStats};
//! use std::sync::Arc;
//!
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted, handshaken connection...
//! let verdict = handle_connection(tls_stream, addr, Arc::clone(&stats)).await;
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
