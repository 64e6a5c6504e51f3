//! # DEF plaintext compression
//!
//! Raw DEFLATE ([RFC1951]) applied to the plaintext when the JWE header
//! carries `"zip": "DEF"`.
//!
//! [RFC1951]: https://www.rfc-editor.org/rfc/rfc1951

use std::io::Read;

use flate2::read::{DeflateDecoder, DeflateEncoder};
use flate2::Compression;

use crate::error::{Error, Result};

/// Compresses plaintext with raw DEFLATE.
pub(crate) fn compress(plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(plaintext, Compression::default());
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| Error::Crypto(format!("issue compressing plaintext: {e}")))?;
    Ok(compressed)
}

/// Decompresses verified plaintext. A decompression failure is a crypto
/// error and yields no output.
pub(crate) fn decompress(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(compressed);
    let mut plaintext = Vec::new();
    decoder
        .read_to_end(&mut plaintext)
        .map_err(|e| Error::Crypto(format!("issue decompressing plaintext: {e}")))?;
    Ok(plaintext)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let plaintext = b"compressible compressible compressible compressible".repeat(8);
        let compressed = compress(&plaintext).expect("should compress");
        assert!(compressed.len() < plaintext.len());

        let decompressed = decompress(&compressed).expect("should decompress");
        assert_eq!(decompressed, plaintext);
    }

    #[test]
    fn garbage_fails_with_crypto_error() {
        let err = decompress(&[0xff, 0xff, 0xff, 0xff]).expect_err("should fail");
        assert!(matches!(err, Error::Crypto(_)));
    }
}
