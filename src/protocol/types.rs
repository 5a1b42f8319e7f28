//! Exchange Vocabulary
//!
//! This module defines the constants and the classification logic for the
//! single request/response exchange EchoTLS performs per connection.
//!
//! ## Wire Format
//!
//! There is no framing. The client sends an arbitrary byte payload (at most
//! one buffer's worth is read), and the server always answers with the same
//! fixed literal. The only byte sequence with meaning is the shutdown
//! sentinel at the very start of the payload:
//!
//! ```text
//! "hello"          -> reply, keep listening
//! "shutdown"       -> reply, then stop the server
//! "shutdown now"   -> reply, then stop the server (trailing bytes ignored)
//! "shutdow"        -> reply, keep listening (sentinel is 8 bytes, exact)
//! ```

use std::fmt;

/// The byte sequence that tells the server to terminate after replying.
///
/// Only the first 8 bytes of the payload are compared; anything after
/// the sentinel is ignored.
pub const SHUTDOWN_SENTINEL: &[u8; 8] = b"shutdown";

/// The literal response sent to every client, whatever it asked.
pub const FIXED_REPLY: &[u8] = b"I hear ya fa shizzle!";

/// Maximum number of request bytes read from one connection.
pub const MAX_REQUEST_SIZE: usize = 256;

/// The outcome of classifying one request payload.
///
/// This is what the connection handler reports back to the accept loop,
/// and it drives the server's two-state machine: `Continue` keeps the
/// server listening, `Shutdown` terminates it after the reply is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Serve the next client.
    Continue,
    /// The payload began with the shutdown sentinel; stop after replying.
    Shutdown,
}

impl Verdict {
    /// Returns true if this verdict terminates the server.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Verdict::Shutdown)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Continue => write!(f, "continue"),
            Verdict::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Classifies a request payload.
///
/// Returns [`Verdict::Shutdown`] iff the payload's first 8 bytes equal
/// [`SHUTDOWN_SENTINEL`]. Shorter payloads, including the empty payload,
/// always classify as [`Verdict::Continue`].
///
/// # Example
/// ```
/// use echotls::protocol::{classify, Verdict};
/// assert_eq!(classify(b"hello"), Verdict::Continue);
/// assert_eq!(classify(b"shutdown now"), Verdict::Shutdown);
/// ```
pub fn classify(payload: &[u8]) -> Verdict {
    if payload.starts_with(SHUTDOWN_SENTINEL) {
        Verdict::Shutdown
    } else {
        Verdict::Continue
    }
}
