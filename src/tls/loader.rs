//! Credential Loading and Acceptor Construction
//!
//! This module loads the server's certificate chain and private key from
//! PEM files and builds the `tokio-rustls` acceptor the server handshakes
//! with.
//!
//! Credentials always come from the filesystem. The repository ships a
//! self-signed demonstration pair under `certs/` that the defaults point
//! at; anything real should be given its own files via `--cert`/`--key`.
//!
//! ## Supported Key Formats
//!
//! `rustls-pemfile` recognizes PKCS#8 (`PRIVATE KEY`), PKCS#1
//! (`RSA PRIVATE KEY`), and SEC1 (`EC PRIVATE KEY`) blocks; the first key
//! found in the file is used.

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;
use tracing::debug;

/// Errors that can occur while setting up TLS.
///
/// All of these are startup errors: the server refuses to run without a
/// working certificate/key pair.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// The PEM file could not be read or parsed
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The PEM file contained no CERTIFICATE block
    #[error("no certificate found in {0}")]
    NoCertificates(String),

    /// The PEM file contained no private key block
    #[error("no private key found in {0}")]
    NoPrivateKey(String),

    /// rustls rejected the certificate/key pair
    #[error("invalid certificate/key pair: {0}")]
    Config(#[from] rustls::Error),
}

/// Loads every certificate from a PEM file.
///
/// The first certificate is the server certificate; any further ones are
/// sent as the chain, in file order.
pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Io {
            path: path.display().to_string(),
            source,
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.display().to_string()));
    }

    Ok(certs)
}

/// Loads the first private key from a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Io {
            path: path.display().to_string(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.display().to_string()))
}

/// Builds a TLS acceptor from a certificate file and a key file.
///
/// The server does not request client certificates. Cipher suites and
/// protocol versions are rustls defaults; there are no policy knobs.
///
/// # Example
/// ```ignore
/// use echotls::tls::build_acceptor;
/// use std::path::Path;
///
/// let acceptor = build_acceptor(
///     Path::new("certs/server.crt"),
///     Path::new("certs/server.key"),
/// )?;
/// ```
pub fn build_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, TlsError> {
    let certs = load_certificates(cert_path)?;
    let key = load_private_key(key_path)?;

    debug!(
        cert = %cert_path.display(),
        chain_len = certs.len(),
        "Loaded TLS credentials"
    );

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
