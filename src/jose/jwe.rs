//! # JSON Web Encryption (JWE)
//!
//! JWE ([RFC7516]) specifies how encrypted content can be represented using
//! JSON. See JWA ([RFC7518]) for more on the cryptographic algorithms and
//! identifiers used.
//!
//! This module implements the decryption engine: per-variant algorithm
//! negotiation, content key derivation, authenticated decryption across the
//! CBC+HMAC and AEAD/GCM cipher families, and plaintext decompression. The
//! matching encrypters are provided so content can round-trip without an
//! external producer.
//!
//! The compact-serialization segments (header, encrypted key, IV,
//! ciphertext, integrity value) arrive from an external parser as Base64URL
//! strings; an absent segment is distinct from an empty one.
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

pub mod cipher;
pub mod concat_kdf;
mod deflate;

use std::fmt::{self, Display};
use std::str::FromStr;

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha1::Sha1;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::jose::jwa::{Algorithm, CipherFamily, Compression, EncryptionMethod};

/// The JWE protected header.
///
/// Only the parameters this engine consumes are typed; all other reserved
/// and custom parameters pass through opaque in `additional`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Identifies the algorithm used to encrypt or determine the value of
    /// the content encryption key.
    pub alg: Algorithm,

    /// The algorithm used to perform authenticated encryption on the
    /// plaintext.
    pub enc: EncryptionMethod,

    /// Compression applied to the plaintext before encryption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<Compression>,

    /// Key derivation `PartyUInfo` value as a Base64URL string. Deprecated
    /// draft parameter, still honoured for wire compatibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epu: Option<String>,

    /// Key derivation `PartyVInfo` value as a Base64URL string. Deprecated
    /// draft parameter, still honoured for wire compatibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epv: Option<String>,

    /// Reserved and custom header parameters not consumed by this engine.
    #[serde(flatten)]
    pub additional: Map<String, Value>,

    // The header segment exactly as received from the wire. The MAC/AAD
    // framing authenticates these bytes, not a re-serialization.
    #[serde(skip)]
    raw: Option<String>,
}

impl Header {
    /// Creates a header for the given algorithm/method pair.
    #[must_use]
    pub fn new(alg: Algorithm, enc: EncryptionMethod) -> Self {
        Self {
            alg,
            enc,
            ..Self::default()
        }
    }

    /// The Base64URL serialization of this header: the as-received segment
    /// when the header was parsed from the wire, otherwise a fresh
    /// serialization.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if serialization fails.
    pub fn to_base64url(&self) -> Result<String> {
        if let Some(raw) = &self.raw {
            return Ok(raw.clone());
        }
        let bytes = serde_json::to_vec(self)
            .map_err(|e| Error::Parse(format!("issue serializing header: {e}")))?;
        Ok(Base64::encode_string(&bytes))
    }

    fn epu_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.epu
            .as_deref()
            .map(|epu| {
                Base64::decode_vec(epu)
                    .map_err(|e| Error::Validation(format!("issue decoding `epu`: {e}")))
            })
            .transpose()
    }

    fn epv_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.epv
            .as_deref()
            .map(|epv| {
                Base64::decode_vec(epv)
                    .map_err(|e| Error::Validation(format!("issue decoding `epv`: {e}")))
            })
            .transpose()
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_base64url().map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Header {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = Base64::decode_vec(s)
            .map_err(|e| Error::Validation(format!("issue decoding header: {e}")))?;
        let mut header: Self = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Parse(format!("issue deserializing header: {e}")))?;
        header.raw = Some(s.to_string());
        Ok(header)
    }
}

/// The compact-serialization segments produced by an encrypter, each
/// Base64URL encoded. The encrypted key is absent in direct mode.
#[derive(Clone, Debug)]
pub struct JweParts {
    /// The wrapped content master key, absent for direct encryption.
    pub encrypted_key: Option<String>,

    /// The initialization vector.
    pub iv: String,

    /// The ciphertext.
    pub ciphertext: String,

    /// The integrity value: HMAC output for the CBC+HMAC family, AEAD tag
    /// for the GCM family.
    pub integrity_value: String,
}

/// Decrypter of JWE content.
///
/// Each variant declares fixed, immutable sets of supported algorithms and
/// encryption methods at construction; [`JweDecrypter::validate_header`]
/// rejects headers outside those sets and a variant never substitutes or
/// broadens the header-declared algorithm. Implementations are immutable
/// and safe for unsynchronized concurrent use.
pub trait JweDecrypter {
    /// The JWE `alg` values this variant accepts.
    fn supported_algorithms(&self) -> &'static [Algorithm];

    /// The JWE `enc` values this variant accepts.
    fn supported_encryption_methods(&self) -> &'static [EncryptionMethod];

    /// Checks the header's algorithm/method pair against this variant's
    /// supported sets.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedAlgorithm` if either value is outside the
    /// variant's sets.
    fn validate_header(&self, header: &Header) -> Result<()> {
        if !self.supported_algorithms().contains(&header.alg) {
            return Err(Error::UnsupportedAlgorithm(format!(
                "\"{}\" is not an accepted \"alg\" value",
                header.alg
            )));
        }
        if !self.supported_encryption_methods().contains(&header.enc) {
            return Err(Error::UnsupportedAlgorithm(format!(
                "\"{}\" is not an accepted \"enc\" value",
                header.enc
            )));
        }
        Ok(())
    }

    /// Decrypts and verifies JWE content from its compact-serialization
    /// segments. Returns the plaintext, decompressed if the header declares
    /// a compression algorithm. A failing call returns no partial output.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for missing or mode-mismatched segments,
    /// `Error::UnsupportedAlgorithm` for an unsupported `alg`/`enc` pair,
    /// `Error::Integrity` on MAC or AEAD tag mismatch and `Error::Crypto`
    /// for cipher, KDF or decompression failures.
    fn decrypt(
        &self, header: &Header, encrypted_key: Option<&str>, iv: Option<&str>, ciphertext: &str,
        integrity_value: Option<&str>,
    ) -> Result<Vec<u8>>;
}

/// Encrypter of JWE content, the producing counterpart of a
/// [`JweDecrypter`] variant. Shares the variant's negotiation sets.
pub trait JweEncrypter {
    /// The JWE `alg` values this variant accepts.
    fn supported_algorithms(&self) -> &'static [Algorithm];

    /// The JWE `enc` values this variant accepts.
    fn supported_encryption_methods(&self) -> &'static [EncryptionMethod];

    /// Checks the header's algorithm/method pair against this variant's
    /// supported sets.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedAlgorithm` if either value is outside the
    /// variant's sets.
    fn validate_header(&self, header: &Header) -> Result<()> {
        if !self.supported_algorithms().contains(&header.alg) {
            return Err(Error::UnsupportedAlgorithm(format!(
                "\"{}\" is not an accepted \"alg\" value",
                header.alg
            )));
        }
        if !self.supported_encryption_methods().contains(&header.enc) {
            return Err(Error::UnsupportedAlgorithm(format!(
                "\"{}\" is not an accepted \"enc\" value",
                header.enc
            )));
        }
        Ok(())
    }

    /// Encrypts plaintext under the given header, returning the
    /// compact-serialization segments.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedAlgorithm` for an unsupported `alg`/`enc`
    /// pair and `Error::Crypto` for cipher or key failures.
    fn encrypt(&self, header: &Header, plaintext: &[u8]) -> Result<JweParts>;
}

/// Negotiation sets for the direct shared-key variant. The 192-bit methods
/// are excluded: a direct master key must be 128, 256 or 512 bits.
const DIRECT_ALGORITHMS: &[Algorithm] = &[Algorithm::Dir];
const DIRECT_ENCRYPTION_METHODS: &[EncryptionMethod] = &[
    EncryptionMethod::A128CbcHs256,
    EncryptionMethod::A256CbcHs512,
    EncryptionMethod::A128Gcm,
    EncryptionMethod::A256Gcm,
];

/// Negotiation sets for the RSA key-wrap variant.
const RSA_ALGORITHMS: &[Algorithm] = &[Algorithm::Rsa1_5, Algorithm::RsaOaep];
const RSA_ENCRYPTION_METHODS: &[EncryptionMethod] = &[
    EncryptionMethod::A128CbcHs256,
    EncryptionMethod::A192CbcHs384,
    EncryptionMethod::A256CbcHs512,
    EncryptionMethod::A128Gcm,
    EncryptionMethod::A192Gcm,
    EncryptionMethod::A256Gcm,
];

/// Direct decrypter using a shared symmetric content master key.
///
/// The key is validated once at construction and never mutated; a decrypter
/// holds no per-call state and may be shared across threads.
#[derive(Debug)]
pub struct DirectDecrypter {
    cmk: Zeroizing<Vec<u8>>,
}

impl DirectDecrypter {
    /// Creates a new direct decrypter with the shared symmetric key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Crypto` unless the key is 128, 256 or 512 bits long.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self> {
        let cmk = Zeroizing::new(key.into());
        validate_master_key(&cmk)?;
        Ok(Self { cmk })
    }
}

impl JweDecrypter for DirectDecrypter {
    fn supported_algorithms(&self) -> &'static [Algorithm] {
        DIRECT_ALGORITHMS
    }

    fn supported_encryption_methods(&self) -> &'static [EncryptionMethod] {
        DIRECT_ENCRYPTION_METHODS
    }

    fn decrypt(
        &self, header: &Header, encrypted_key: Option<&str>, iv: Option<&str>, ciphertext: &str,
        integrity_value: Option<&str>,
    ) -> Result<Vec<u8>> {
        if encrypted_key.is_some() {
            return Err(Error::Validation("unexpected encrypted key, must be omitted".into()));
        }
        let iv = iv
            .ok_or_else(|| Error::Validation("the initialization vector must not be absent".into()))?;
        let integrity_value = integrity_value
            .ok_or_else(|| Error::Validation("the integrity value must not be absent".into()))?;

        self.validate_header(header)?;
        debug!(alg = %header.alg, enc = %header.enc, "decrypting JWE (direct)");

        decrypt_content(header, &self.cmk, "", iv, ciphertext, integrity_value)
    }
}

/// Direct encrypter using a shared symmetric content master key.
pub struct DirectEncrypter {
    cmk: Zeroizing<Vec<u8>>,
}

impl DirectEncrypter {
    /// Creates a new direct encrypter with the shared symmetric key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Crypto` unless the key is 128, 256 or 512 bits long.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self> {
        let cmk = Zeroizing::new(key.into());
        validate_master_key(&cmk)?;
        Ok(Self { cmk })
    }
}

impl JweEncrypter for DirectEncrypter {
    fn supported_algorithms(&self) -> &'static [Algorithm] {
        DIRECT_ALGORITHMS
    }

    fn supported_encryption_methods(&self) -> &'static [EncryptionMethod] {
        DIRECT_ENCRYPTION_METHODS
    }

    fn encrypt(&self, header: &Header, plaintext: &[u8]) -> Result<JweParts> {
        self.validate_header(header)?;

        let (iv, ciphertext, integrity_value) =
            encrypt_content(header, &self.cmk, "", plaintext)?;

        Ok(JweParts {
            encrypted_key: None,
            iv,
            ciphertext,
            integrity_value,
        })
    }
}

/// RSA key-wrap decrypter. The recipient's private key unwraps the content
/// master key before content decryption proceeds.
pub struct RsaDecrypter {
    private_key: RsaPrivateKey,
}

impl RsaDecrypter {
    /// Creates a new RSA decrypter with the recipient's private key.
    #[must_use]
    pub const fn new(private_key: RsaPrivateKey) -> Self {
        Self { private_key }
    }

    fn unwrap_key(&self, alg: Algorithm, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let cmk = match alg {
            Algorithm::Rsa1_5 => self.private_key.decrypt(Pkcs1v15Encrypt, wrapped),
            Algorithm::RsaOaep => self.private_key.decrypt(Oaep::new::<Sha1>(), wrapped),
            Algorithm::Dir => {
                return Err(Error::UnsupportedAlgorithm(
                    "\"dir\" does not use an encrypted key".into(),
                ))
            }
        }
        .map_err(|e| Error::Crypto(format!("issue unwrapping content master key: {e}")))?;

        Ok(Zeroizing::new(cmk))
    }
}

impl JweDecrypter for RsaDecrypter {
    fn supported_algorithms(&self) -> &'static [Algorithm] {
        RSA_ALGORITHMS
    }

    fn supported_encryption_methods(&self) -> &'static [EncryptionMethod] {
        RSA_ENCRYPTION_METHODS
    }

    fn decrypt(
        &self, header: &Header, encrypted_key: Option<&str>, iv: Option<&str>, ciphertext: &str,
        integrity_value: Option<&str>,
    ) -> Result<Vec<u8>> {
        let encrypted_key = encrypted_key
            .ok_or_else(|| Error::Validation("the encrypted key must not be absent".into()))?;
        let iv = iv
            .ok_or_else(|| Error::Validation("the initialization vector must not be absent".into()))?;
        let integrity_value = integrity_value
            .ok_or_else(|| Error::Validation("the integrity value must not be absent".into()))?;

        self.validate_header(header)?;
        debug!(alg = %header.alg, enc = %header.enc, "decrypting JWE (RSA key unwrap)");

        let wrapped = Base64::decode_vec(encrypted_key)
            .map_err(|e| Error::Validation(format!("issue decoding `encrypted_key`: {e}")))?;
        let cmk = self.unwrap_key(header.alg, &wrapped)?;

        decrypt_content(header, &cmk, encrypted_key, iv, ciphertext, integrity_value)
    }
}

/// RSA key-wrap encrypter. Generates a fresh content master key per call
/// and wraps it under the recipient's public key.
pub struct RsaEncrypter {
    public_key: RsaPublicKey,
}

impl RsaEncrypter {
    /// Creates a new RSA encrypter with the recipient's public key.
    #[must_use]
    pub const fn new(public_key: RsaPublicKey) -> Self {
        Self { public_key }
    }
}

impl JweEncrypter for RsaEncrypter {
    fn supported_algorithms(&self) -> &'static [Algorithm] {
        RSA_ALGORITHMS
    }

    fn supported_encryption_methods(&self) -> &'static [EncryptionMethod] {
        RSA_ENCRYPTION_METHODS
    }

    fn encrypt(&self, header: &Header, plaintext: &[u8]) -> Result<JweParts> {
        self.validate_header(header)?;

        let mut cmk = Zeroizing::new(vec![0u8; header.enc.cmk_bit_length() / 8]);
        OsRng.fill_bytes(&mut cmk);

        let wrapped = match header.alg {
            Algorithm::Rsa1_5 => self.public_key.encrypt(&mut OsRng, Pkcs1v15Encrypt, &cmk),
            Algorithm::RsaOaep => self.public_key.encrypt(&mut OsRng, Oaep::new::<Sha1>(), &cmk),
            Algorithm::Dir => {
                return Err(Error::UnsupportedAlgorithm(
                    "\"dir\" does not use an encrypted key".into(),
                ))
            }
        }
        .map_err(|e| Error::Crypto(format!("issue wrapping content master key: {e}")))?;
        let encrypted_key = Base64::encode_string(&wrapped);

        let (iv, ciphertext, integrity_value) =
            encrypt_content(header, &cmk, &encrypted_key, plaintext)?;

        Ok(JweParts {
            encrypted_key: Some(encrypted_key),
            iv,
            ciphertext,
            integrity_value,
        })
    }
}

// A content master key must be 128, 256 or 512 bits.
fn validate_master_key(key: &[u8]) -> Result<()> {
    if !matches!(key.len(), 16 | 32 | 64) {
        return Err(Error::Crypto(format!(
            "the key length must be 128, 256 or 512 bits, got {} bits",
            key.len() * 8
        )));
    }
    Ok(())
}

// Shared content decryption pipeline: derive or adopt the content keys,
// decrypt via the method's cipher family, check integrity, decompress.
fn decrypt_content(
    header: &Header, cmk: &[u8], encrypted_key_b64: &str, iv_b64: &str, ciphertext_b64: &str,
    integrity_b64: &str,
) -> Result<Vec<u8>> {
    let enc = header.enc;

    if cmk.len() * 8 != enc.cmk_bit_length() {
        return Err(Error::Crypto(format!(
            "the content master key must be {} bits for {enc}, got {} bits",
            enc.cmk_bit_length(),
            cmk.len() * 8
        )));
    }

    let iv = Base64::decode_vec(iv_b64)
        .map_err(|e| Error::Validation(format!("issue decoding `iv`: {e}")))?;
    let ciphertext = Base64::decode_vec(ciphertext_b64)
        .map_err(|e| Error::Validation(format!("issue decoding `ciphertext`: {e}")))?;
    let integrity_value = Base64::decode_vec(integrity_b64)
        .map_err(|e| Error::Validation(format!("issue decoding `integrity_value`: {e}")))?;

    let plaintext = match enc.family() {
        CipherFamily::CbcHmac => {
            let epu = header.epu_bytes()?;
            let epv = header.epv_bytes()?;

            let cek = concat_kdf::derive_cek(cmk, enc, epu.as_deref(), epv.as_deref())?;

            // Decrypt-then-verify: this ordering matches the draft the wire
            // format was built against and must not be reordered.
            let plaintext = cipher::cbc_decrypt(&cek, &iv, &ciphertext)?;

            let cik = concat_kdf::derive_cik(cmk, enc, epu.as_deref(), epv.as_deref())?;
            let mac_input = format!(
                "{}.{encrypted_key_b64}.{iv_b64}.{ciphertext_b64}",
                header.to_base64url()?
            );
            let mac = cipher::hmac_compute(enc, &cik, mac_input.as_bytes())?;

            if !cipher::constant_time_eq(&integrity_value, &mac) {
                return Err(Error::Integrity("HMAC integrity check failed".into()));
            }
            plaintext
        }
        CipherFamily::Gcm => {
            let aad = format!("{}.{encrypted_key_b64}.{iv_b64}", header.to_base64url()?);
            cipher::gcm_decrypt(cmk, &iv, &ciphertext, aad.as_bytes(), &integrity_value)?
        }
    };

    if let Some(Compression::Deflate) = header.zip {
        debug!("applying DEF decompression");
        return deflate::decompress(&plaintext);
    }
    Ok(plaintext)
}

// Shared content encryption: the producing mirror of `decrypt_content`.
fn encrypt_content(
    header: &Header, cmk: &[u8], encrypted_key_b64: &str, plaintext: &[u8],
) -> Result<(String, String, String)> {
    let enc = header.enc;

    if cmk.len() * 8 != enc.cmk_bit_length() {
        return Err(Error::Crypto(format!(
            "the content master key must be {} bits for {enc}, got {} bits",
            enc.cmk_bit_length(),
            cmk.len() * 8
        )));
    }

    let plaintext = if let Some(Compression::Deflate) = header.zip {
        deflate::compress(plaintext)?
    } else {
        plaintext.to_vec()
    };

    match enc.family() {
        CipherFamily::CbcHmac => {
            let mut iv = [0u8; 16];
            OsRng.fill_bytes(&mut iv);
            let iv_b64 = Base64::encode_string(&iv);

            let epu = header.epu_bytes()?;
            let epv = header.epv_bytes()?;

            let cek = concat_kdf::derive_cek(cmk, enc, epu.as_deref(), epv.as_deref())?;
            let ciphertext = cipher::cbc_encrypt(&cek, &iv, &plaintext)?;
            let ciphertext_b64 = Base64::encode_string(&ciphertext);

            let cik = concat_kdf::derive_cik(cmk, enc, epu.as_deref(), epv.as_deref())?;
            let mac_input = format!(
                "{}.{encrypted_key_b64}.{iv_b64}.{ciphertext_b64}",
                header.to_base64url()?
            );
            let mac = cipher::hmac_compute(enc, &cik, mac_input.as_bytes())?;

            Ok((iv_b64, ciphertext_b64, Base64::encode_string(&mac)))
        }
        CipherFamily::Gcm => {
            let mut iv = [0u8; 12];
            OsRng.fill_bytes(&mut iv);
            let iv_b64 = Base64::encode_string(&iv);

            let aad = format!("{}.{encrypted_key_b64}.{iv_b64}", header.to_base64url()?);
            let (ciphertext, tag) = cipher::gcm_encrypt(cmk, &iv, &plaintext, aad.as_bytes())?;

            Ok((iv_b64, Base64::encode_string(&ciphertext), Base64::encode_string(&tag)))
        }
    }
}
