use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// Keystore lookup failed: bad path, unknown alias, or wrong password.
    #[error("Failed to retrieve key from keystore: {0}")]
    KeyRetrieval(String),

    /// Caller-supplied key material could not be parsed.
    #[error("Malformed key material: {0}")]
    KeyFormat(String),

    /// Caller-supplied input (e.g. hex-encoded recipient key) is malformed.
    #[error("Malformed input: {0}")]
    InputFormat(String),

    /// The signing key uses an algorithm outside the RSA/DSA allowlist.
    #[error("The signing key uses an unsupported algorithm ({0}). Only RSA and DSA are supported.")]
    UnsupportedAlgorithm(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    /// The output destination must be created fresh, never overwritten.
    #[error("Output path already exists: {}", .0.display())]
    OutputAlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
