//! # Errors
//!
//! Failure kinds surfaced by the JWE engine and the JWK key material. Every
//! failure propagates to the caller as a single terminal error with a
//! descriptive cause; nothing is retried internally and no partial plaintext
//! ever escapes a failed call.

use thiserror::Error;

/// Result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds for JWE processing and JWK handling.
#[derive(Error, Debug)]
pub enum Error {
    /// A compact-serialization part is malformed or missing, or the header
    /// does not match the decrypter's mode (e.g. an unexpected encrypted
    /// key).
    #[error("validation error: {0}")]
    Validation(String),

    /// The header's `alg` or `enc` value is outside the set negotiated by
    /// this decrypter variant.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A cryptographic operation failed: bad key length, curve parameter
    /// lookup, cipher or KDF internal failure, or decompression failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// An HMAC or AEAD authentication tag did not match.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Malformed JSON or JWK, or a key-type mismatch.
    #[error("parse error: {0}")]
    Parse(String),
}
