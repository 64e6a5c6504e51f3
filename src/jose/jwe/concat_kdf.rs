//! # Concatenation Key Derivation Function
//!
//! One-step KDF from NIST SP 800-56A section 5.8.1 (Approved Alternative 1)
//! with SHA-256 as the hashing function: successive digests of
//! `counter || sharedSecret || otherInfo` are concatenated until enough
//! output exists, then truncated to the requested length.
//!
//! The CBC+HMAC encryption methods use it to derive the content encryption
//! key (CEK) and content integrity key (CIK) from the content master key;
//! the two derivations differ only in their label and requested length.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::jose::jwa::EncryptionMethod;

const ENCRYPTION_LABEL: &[u8] = b"Encryption";
const INTEGRITY_LABEL: &[u8] = b"Integrity";

/// Derives the content encryption key for a CBC+HMAC method.
///
/// # Errors
///
/// Returns `Error::Crypto` if the method's key length cannot be derived.
pub fn derive_cek(
    master_key: &[u8], enc: EncryptionMethod, epu: Option<&[u8]>, epv: Option<&[u8]>,
) -> Result<Zeroizing<Vec<u8>>> {
    derive(master_key, enc.cek_bit_length(), enc, epu, epv, ENCRYPTION_LABEL)
}

/// Derives the content integrity key for a CBC+HMAC method.
///
/// # Errors
///
/// Returns `Error::Crypto` if the method's key length cannot be derived.
pub fn derive_cik(
    master_key: &[u8], enc: EncryptionMethod, epu: Option<&[u8]>, epv: Option<&[u8]>,
) -> Result<Zeroizing<Vec<u8>>> {
    derive(master_key, enc.cik_bit_length(), enc, epu, epv, INTEGRITY_LABEL)
}

// otherInfo = AlgorithmID (the UTF-8 "enc" value) || PartyUInfo || PartyVInfo
//             || SuppPubInfo (requested bits as a 32-bit big-endian integer
//             followed by the derivation label).
fn derive(
    master_key: &[u8], key_bits: usize, enc: EncryptionMethod, epu: Option<&[u8]>,
    epv: Option<&[u8]>, label: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if key_bits == 0 || key_bits % 8 != 0 {
        return Err(Error::Crypto(format!("cannot derive a {key_bits}-bit key")));
    }
    let key_len = key_bits / 8;

    let mut other_info = Vec::new();
    other_info.extend_from_slice(enc.name().as_bytes());
    other_info.extend_from_slice(epu.unwrap_or_default());
    other_info.extend_from_slice(epv.unwrap_or_default());
    other_info.extend_from_slice(&u32::try_from(key_bits).map_err(|_| {
        Error::Crypto(format!("requested key length {key_bits} is not representable"))
    })?
    .to_be_bytes());
    other_info.extend_from_slice(label);

    let mut derived = Zeroizing::new(Vec::with_capacity(key_len));
    let mut counter = 1u32;

    while derived.len() < key_len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(master_key);
        hasher.update(&other_info);
        derived.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    derived.truncate(key_len);

    Ok(derived)
}

#[cfg(test)]
mod test {
    use super::*;

    const MASTER_KEY_256: [u8; 32] = [7u8; 32];
    const MASTER_KEY_512: [u8; 64] = [9u8; 64];

    #[test]
    fn derived_lengths_split_master_key() {
        let cek = derive_cek(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, None, None)
            .expect("should derive");
        let cik = derive_cik(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, None, None)
            .expect("should derive");
        assert_eq!(cek.len(), 16);
        assert_eq!(cik.len(), 16);

        let cek = derive_cek(&MASTER_KEY_512, EncryptionMethod::A256CbcHs512, None, None)
            .expect("should derive");
        let cik = derive_cik(&MASTER_KEY_512, EncryptionMethod::A256CbcHs512, None, None)
            .expect("should derive");
        assert_eq!(cek.len(), 32);
        assert_eq!(cik.len(), 32);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let a = derive_cek(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, Some(b"u"), Some(b"v"))
            .expect("should derive");
        let b = derive_cek(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, Some(b"u"), Some(b"v"))
            .expect("should derive");
        assert_eq!(*a, *b);
    }

    #[test]
    fn cek_and_cik_differ() {
        let cek = derive_cek(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, None, None)
            .expect("should derive");
        let cik = derive_cik(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, None, None)
            .expect("should derive");
        assert_ne!(*cek, *cik);
    }

    #[test]
    fn party_info_changes_output() {
        let plain = derive_cek(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, None, None)
            .expect("should derive");
        let with_epu =
            derive_cek(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, Some(b"Alice"), None)
                .expect("should derive");
        let with_epv =
            derive_cek(&MASTER_KEY_256, EncryptionMethod::A128CbcHs256, None, Some(b"Bob"))
                .expect("should derive");

        assert_ne!(*plain, *with_epu);
        assert_ne!(*plain, *with_epv);
        assert_ne!(*with_epu, *with_epv);
    }

    #[test]
    fn multi_block_derivation_truncates_to_exact_length() {
        // a 384-bit request spans two SHA-256 blocks; the output must open
        // with the round-1 digest and be truncated to exactly 48 bytes
        let enc = EncryptionMethod::A256CbcHs512;
        let long = derive(&MASTER_KEY_512, 384, enc, None, None, ENCRYPTION_LABEL)
            .expect("should derive");
        assert_eq!(long.len(), 48);

        let mut other_info = Vec::new();
        other_info.extend_from_slice(enc.name().as_bytes());
        other_info.extend_from_slice(&384u32.to_be_bytes());
        other_info.extend_from_slice(ENCRYPTION_LABEL);

        let mut hasher = Sha256::new();
        hasher.update(1u32.to_be_bytes());
        hasher.update(MASTER_KEY_512);
        hasher.update(&other_info);
        let round_1 = hasher.finalize();

        assert_eq!(long[..32], round_1[..]);
    }

    #[test]
    fn unachievable_length_is_rejected() {
        let err = derive(
            &MASTER_KEY_256, 12, EncryptionMethod::A128CbcHs256, None, None, ENCRYPTION_LABEL,
        )
        .expect_err("should fail");
        assert!(matches!(err, Error::Crypto(_)));
    }
}
