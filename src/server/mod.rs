//! Server Module
//!
//! This module owns the listening socket and the sequential accept loop.
//! One client is served at a time, start to finish, and the loop keeps
//! going until an exchange reports the shutdown verdict.
//!
//! ## Example
//!
//! ```ignore
//! use echotls::server::Server;
//! use std::path::Path;
//!
//! let server = Server::bind(
//!     "0.0.0.0:11111",
//!     Path::new("certs/server.crt"),
//!     Path::new("certs/server.key"),
//! )
//! .await?;
//!
//! server.run().await;
//! ```

pub mod accept;

// Re-export commonly used types
pub use accept::{Server, ServerError};
