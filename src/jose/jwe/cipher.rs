//! # Authenticated encryption primitives
//!
//! The two cipher families a JWE encryption method can dispatch to:
//! AES-CBC with PKCS#7 padding plus a separate HMAC integrity value, and
//! AES-GCM where the cipher itself produces the authentication tag.
//!
//! Key sizes select the AES variant; the caller supplies keys of the exact
//! length mandated by the negotiated encryption method.

use aes::cipher::block_padding::Pkcs7;
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::KeyInit;
use aes_gcm::{AeadInPlace, Aes128Gcm, Aes256Gcm, AesGcm, Key, Nonce, Tag};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::jose::jwa::EncryptionMethod;

type Aes192Gcm = AesGcm<Aes192, U12>;

const CBC_IV_LENGTH: usize = 16;
const GCM_IV_LENGTH: usize = 12;
const GCM_TAG_LENGTH: usize = 16;

/// Decrypts AES-CBC ciphertext and strips PKCS#7 padding. A padding or
/// block-alignment failure is a crypto error.
pub(crate) fn cbc_decrypt(cek: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if iv.len() != CBC_IV_LENGTH {
        return Err(Error::Crypto(format!(
            "CBC initialization vector must be {CBC_IV_LENGTH} bytes, got {}",
            iv.len()
        )));
    }

    match cek.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(cek, iv)
            .map_err(|e| Error::Crypto(format!("issue initializing AES-128-CBC: {e}")))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| Error::Crypto("invalid CBC padding".into())),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(cek, iv)
            .map_err(|e| Error::Crypto(format!("issue initializing AES-192-CBC: {e}")))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| Error::Crypto("invalid CBC padding".into())),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(cek, iv)
            .map_err(|e| Error::Crypto(format!("issue initializing AES-256-CBC: {e}")))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| Error::Crypto("invalid CBC padding".into())),
        n => Err(Error::Crypto(format!("unexpected CBC key length: {n} bytes"))),
    }
}

/// Encrypts plaintext with AES-CBC and PKCS#7 padding.
pub(crate) fn cbc_encrypt(cek: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if iv.len() != CBC_IV_LENGTH {
        return Err(Error::Crypto(format!(
            "CBC initialization vector must be {CBC_IV_LENGTH} bytes, got {}",
            iv.len()
        )));
    }

    match cek.len() {
        16 => Ok(cbc::Encryptor::<Aes128>::new_from_slices(cek, iv)
            .map_err(|e| Error::Crypto(format!("issue initializing AES-128-CBC: {e}")))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        24 => Ok(cbc::Encryptor::<Aes192>::new_from_slices(cek, iv)
            .map_err(|e| Error::Crypto(format!("issue initializing AES-192-CBC: {e}")))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        32 => Ok(cbc::Encryptor::<Aes256>::new_from_slices(cek, iv)
            .map_err(|e| Error::Crypto(format!("issue initializing AES-256-CBC: {e}")))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        n => Err(Error::Crypto(format!("unexpected CBC key length: {n} bytes"))),
    }
}

/// Computes the HMAC integrity value over the MAC input using the method's
/// hash, truncated to the method's mandated tag length.
pub(crate) fn hmac_compute(enc: EncryptionMethod, cik: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = match enc {
        EncryptionMethod::A128CbcHs256 => {
            let mut mac = <Hmac::<Sha256> as Mac>::new_from_slice(cik)
                .map_err(|e| Error::Crypto(format!("issue initializing HMAC: {e}")))?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        EncryptionMethod::A192CbcHs384 => {
            let mut mac = <Hmac::<Sha384> as Mac>::new_from_slice(cik)
                .map_err(|e| Error::Crypto(format!("issue initializing HMAC: {e}")))?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        EncryptionMethod::A256CbcHs512 => {
            let mut mac = <Hmac::<Sha512> as Mac>::new_from_slice(cik)
                .map_err(|e| Error::Crypto(format!("issue initializing HMAC: {e}")))?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        _ => {
            return Err(Error::UnsupportedAlgorithm(format!(
                "no HMAC defined for encryption method {enc}"
            )))
        }
    };
    mac.truncate(enc.tag_length());
    Ok(mac)
}

/// Single authenticated-decrypt call for the AEAD family. A tag mismatch
/// surfaces directly from the underlying primitive as an integrity error.
pub(crate) fn gcm_decrypt(
    key: &[u8], iv: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8],
) -> Result<Vec<u8>> {
    if iv.len() != GCM_IV_LENGTH {
        return Err(Error::Crypto(format!(
            "GCM initialization vector must be {GCM_IV_LENGTH} bytes, got {}",
            iv.len()
        )));
    }
    if tag.len() != GCM_TAG_LENGTH {
        return Err(Error::Crypto(format!(
            "GCM authentication tag must be {GCM_TAG_LENGTH} bytes, got {}",
            tag.len()
        )));
    }

    let nonce = Nonce::from_slice(iv);
    let tag = Tag::from_slice(tag);
    let mut buffer = ciphertext.to_vec();

    let outcome = match key.len() {
        16 => Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(key))
            .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
        24 => Aes192Gcm::new(Key::<Aes192Gcm>::from_slice(key))
            .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
        32 => Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
            .decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
        n => return Err(Error::Crypto(format!("unexpected GCM key length: {n} bytes"))),
    };

    outcome.map_err(|_| Error::Integrity("AEAD authentication failed".into()))?;
    Ok(buffer)
}

/// Encrypts plaintext with AES-GCM, returning the ciphertext and the
/// detached authentication tag.
pub(crate) fn gcm_encrypt(
    key: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    if iv.len() != GCM_IV_LENGTH {
        return Err(Error::Crypto(format!(
            "GCM initialization vector must be {GCM_IV_LENGTH} bytes, got {}",
            iv.len()
        )));
    }

    let nonce = Nonce::from_slice(iv);
    let mut buffer = plaintext.to_vec();

    let tag = match key.len() {
        16 => Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(key))
            .encrypt_in_place_detached(nonce, aad, &mut buffer),
        24 => Aes192Gcm::new(Key::<Aes192Gcm>::from_slice(key))
            .encrypt_in_place_detached(nonce, aad, &mut buffer),
        32 => Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
            .encrypt_in_place_detached(nonce, aad, &mut buffer),
        n => return Err(Error::Crypto(format!("unexpected GCM key length: {n} bytes"))),
    }
    .map_err(|e| Error::Crypto(format!("issue encrypting: {e}")))?;

    Ok((buffer, tag.to_vec()))
}

/// Constant-time equality over two byte sequences. The comparison scans the
/// full length of both buffers without short-circuiting on the first
/// differing byte; lengths are public and may be compared directly.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cbc_round_trip() {
        let cek = [1u8; 16];
        let iv = [2u8; 16];
        let plaintext = b"Live long and prosper.";

        let ciphertext = cbc_encrypt(&cek, &iv, plaintext).expect("should encrypt");
        assert_eq!(ciphertext.len() % 16, 0);

        let decrypted = cbc_decrypt(&cek, &iv, &ciphertext).expect("should decrypt");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn cbc_rejects_misaligned_ciphertext() {
        let err = cbc_decrypt(&[1u8; 16], &[2u8; 16], &[0u8; 17]).expect_err("should fail");
        assert!(matches!(err, Error::Crypto(_)));
    }

    #[test]
    fn cbc_rejects_bad_key_length() {
        let err = cbc_decrypt(&[1u8; 15], &[2u8; 16], &[0u8; 16]).expect_err("should fail");
        assert!(matches!(err, Error::Crypto(_)));
    }

    #[test]
    fn gcm_round_trip_with_aad() {
        let key = [3u8; 32];
        let iv = [4u8; 12];
        let plaintext = b"The truth is out there.";
        let aad = b"eyJhbGciOiJkaXIifQ..BBBB";

        let (ciphertext, tag) = gcm_encrypt(&key, &iv, plaintext, aad).expect("should encrypt");
        let decrypted = gcm_decrypt(&key, &iv, &ciphertext, aad, &tag).expect("should decrypt");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn gcm_tag_mismatch_is_integrity_error() {
        let key = [3u8; 16];
        let iv = [4u8; 12];
        let (ciphertext, mut tag) = gcm_encrypt(&key, &iv, b"text", b"aad").expect("should encrypt");

        tag[0] ^= 0x01;
        let err = gcm_decrypt(&key, &iv, &ciphertext, b"aad", &tag).expect_err("should fail");
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn gcm_aad_mismatch_is_integrity_error() {
        let key = [3u8; 16];
        let iv = [4u8; 12];
        let (ciphertext, tag) = gcm_encrypt(&key, &iv, b"text", b"aad").expect("should encrypt");

        let err = gcm_decrypt(&key, &iv, &ciphertext, b"tampered", &tag).expect_err("should fail");
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn hmac_lengths_match_method() {
        let data = b"header..iv.ciphertext";
        let mac = hmac_compute(EncryptionMethod::A128CbcHs256, &[5u8; 16], data)
            .expect("should compute");
        assert_eq!(mac.len(), 32);

        let mac = hmac_compute(EncryptionMethod::A256CbcHs512, &[5u8; 32], data)
            .expect("should compute");
        assert_eq!(mac.len(), 64);
    }

    #[test]
    fn hmac_rejects_aead_methods() {
        let err = hmac_compute(EncryptionMethod::A128Gcm, &[5u8; 16], b"data")
            .expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn constant_time_comparison() {
        assert!(constant_time_eq(b"same bytes", b"same bytes"));
        assert!(!constant_time_eq(b"same bytes", b"Same bytes"));
        assert!(!constant_time_eq(b"short", b"longer value"));
        assert!(constant_time_eq(b"", b""));
    }
}
