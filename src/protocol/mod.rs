//! Exchange Protocol
//!
//! This module defines the tiny application-level protocol EchoTLS speaks.
//!
//! ## Overview
//!
//! The protocol is deliberately minimal: the client sends an arbitrary byte
//! payload, the server replies with one fixed literal, and the connection is
//! done. The only payload the server interprets is the 8-byte shutdown
//! sentinel at the start of a request, which tells the server to terminate
//! after sending its reply.
//!
//! ## Modules
//!
//! - `types`: Sentinel and reply constants, plus the `Verdict` classification
//!
//! ## Example
//!
//! ```
//! use echotls::protocol::{classify, Verdict, FIXED_REPLY};
//!
//! assert_eq!(classify(b"hello"), Verdict::Continue);
//! assert_eq!(classify(b"shutdown now"), Verdict::Shutdown);
//! assert_eq!(FIXED_REPLY, b"I hear ya fa shizzle!");
//! ```

pub mod types;

// Re-export commonly used types for convenience
pub use types::{classify, Verdict, FIXED_REPLY, MAX_REQUEST_SIZE, SHUTDOWN_SENTINEL};
