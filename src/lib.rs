//! A JOSE (JSON Object Signing and Encryption) toolkit: the JWE ([RFC7516])
//! decryption engine together with the Elliptic Curve JWK ([RFC7517]) key
//! material it depends on.
//!
//! The engine negotiates algorithm/method pairs per decrypter variant,
//! derives content keys with the SP 800-56A concatenation KDF, performs
//! authenticated decryption across the CBC+HMAC and AEAD/GCM cipher
//! families with constant-time integrity checks, and decompresses verified
//! plaintext when the header asks for it.
//!
//! A decrypter is immutable after construction and safe for unsynchronized
//! concurrent use; every call is an independent run with no shared mutable
//! state.
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

pub mod error;
pub mod jose;

pub use crate::error::{Error, Result};
pub use crate::jose::jwa::{Algorithm, Compression, EncryptionMethod};
pub use crate::jose::jwe::{
    DirectDecrypter, DirectEncrypter, Header, JweDecrypter, JweEncrypter, JweParts, RsaDecrypter,
    RsaEncrypter,
};
pub use crate::jose::jwk::{Curve, EcKey};
