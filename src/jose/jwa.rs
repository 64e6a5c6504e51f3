//! # JSON Web Algorithms (JWA)
//!
//! Identifiers for the cryptographic algorithms used by JWE ([RFC7518]),
//! together with the per-method constants the engine dispatches on.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The algorithm used to encrypt or determine the value of the content
/// encryption key (the JWE `alg` header parameter).
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Direct use of a shared symmetric key.
    #[default]
    #[serde(rename = "dir")]
    Dir,

    /// RSAES-PKCS1-v1_5 key encryption.
    #[serde(rename = "RSA1_5")]
    Rsa1_5,

    /// RSAES-OAEP key encryption.
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
}

impl Algorithm {
    /// The wire name of the algorithm.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dir => "dir",
            Self::Rsa1_5 => "RSA1_5",
            Self::RsaOaep => "RSA-OAEP",
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The algorithm used to perform authenticated encryption on the plaintext
/// (the JWE `enc` header parameter).
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum EncryptionMethod {
    /// AES-CBC with HMAC-SHA-256 integrity (256-bit content master key).
    #[default]
    #[serde(rename = "A128CBC-HS256")]
    A128CbcHs256,

    /// AES-CBC with HMAC-SHA-384 integrity (384-bit content master key).
    #[serde(rename = "A192CBC-HS384")]
    A192CbcHs384,

    /// AES-CBC with HMAC-SHA-512 integrity (512-bit content master key).
    #[serde(rename = "A256CBC-HS512")]
    A256CbcHs512,

    /// AES in Galois/Counter Mode (GCM) using a 128-bit key.
    #[serde(rename = "A128GCM")]
    A128Gcm,

    /// AES in Galois/Counter Mode (GCM) using a 192-bit key.
    #[serde(rename = "A192GCM")]
    A192Gcm,

    /// AES in Galois/Counter Mode (GCM) using a 256-bit key.
    #[serde(rename = "A256GCM")]
    A256Gcm,
}

/// The two structurally different cipher families an encryption method can
/// belong to. Dispatch in the pipeline is exclusively on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherFamily {
    /// AES-CBC confidentiality with a separate HMAC integrity check.
    CbcHmac,

    /// AEAD: AES-GCM with the tag produced by the cipher itself.
    Gcm,
}

impl EncryptionMethod {
    /// The wire name of the encryption method.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    /// The cipher family this method dispatches to.
    #[must_use]
    pub const fn family(self) -> CipherFamily {
        match self {
            Self::A128CbcHs256 | Self::A192CbcHs384 | Self::A256CbcHs512 => CipherFamily::CbcHmac,
            Self::A128Gcm | Self::A192Gcm | Self::A256Gcm => CipherFamily::Gcm,
        }
    }

    /// The required bit length of the content master key for this method.
    ///
    /// For the CBC+HMAC family this is the combined CEK + CIK length; for
    /// the GCM family the master key is used directly as the CEK.
    #[must_use]
    pub const fn cmk_bit_length(self) -> usize {
        match self {
            Self::A128Gcm => 128,
            Self::A192Gcm => 192,
            Self::A128CbcHs256 | Self::A256Gcm => 256,
            Self::A192CbcHs384 => 384,
            Self::A256CbcHs512 => 512,
        }
    }

    /// The derived content encryption key bit length (CBC+HMAC family:
    /// first half of the master key length; GCM: the full key).
    #[must_use]
    pub const fn cek_bit_length(self) -> usize {
        match self.family() {
            CipherFamily::CbcHmac => self.cmk_bit_length() / 2,
            CipherFamily::Gcm => self.cmk_bit_length(),
        }
    }

    /// The derived content integrity key bit length (CBC+HMAC family:
    /// second half of the master key length; zero for AEAD methods).
    #[must_use]
    pub const fn cik_bit_length(self) -> usize {
        match self.family() {
            CipherFamily::CbcHmac => self.cmk_bit_length() / 2,
            CipherFamily::Gcm => 0,
        }
    }

    /// The mandated integrity tag length in bytes: the HMAC output length
    /// for the CBC+HMAC family, the GCM tag length for the AEAD family.
    #[must_use]
    pub const fn tag_length(self) -> usize {
        match self {
            Self::A128CbcHs256 => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
            Self::A128Gcm | Self::A192Gcm | Self::A256Gcm => 16,
        }
    }
}

impl Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The compression algorithm applied to the plaintext before encryption
/// (the JWE `zip` header parameter).
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Compression {
    /// DEFLATE ([RFC1951]).
    ///
    /// [RFC1951]: https://www.rfc-editor.org/rfc/rfc1951
    #[default]
    #[serde(rename = "DEF")]
    Deflate,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_names() {
        let alg: Algorithm = serde_json::from_str("\"RSA1_5\"").expect("should deserialize");
        assert_eq!(alg, Algorithm::Rsa1_5);
        assert_eq!(serde_json::to_string(&Algorithm::Dir).expect("should serialize"), "\"dir\"");

        let enc: EncryptionMethod =
            serde_json::from_str("\"A256CBC-HS512\"").expect("should deserialize");
        assert_eq!(enc, EncryptionMethod::A256CbcHs512);
        assert_eq!(enc.to_string(), "A256CBC-HS512");
    }

    #[test]
    fn cbc_key_split_totals_master_key() {
        for enc in [
            EncryptionMethod::A128CbcHs256,
            EncryptionMethod::A192CbcHs384,
            EncryptionMethod::A256CbcHs512,
        ] {
            assert_eq!(enc.cek_bit_length() + enc.cik_bit_length(), enc.cmk_bit_length());
        }
        assert_eq!(EncryptionMethod::A128CbcHs256.cek_bit_length(), 128);
        assert_eq!(EncryptionMethod::A128CbcHs256.cik_bit_length(), 128);
    }

    #[test]
    fn gcm_uses_master_key_directly() {
        assert_eq!(EncryptionMethod::A256Gcm.cek_bit_length(), 256);
        assert_eq!(EncryptionMethod::A256Gcm.cik_bit_length(), 0);
        assert_eq!(EncryptionMethod::A128Gcm.family(), CipherFamily::Gcm);
    }
}
