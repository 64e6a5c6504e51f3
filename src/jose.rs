//! # JSON Object Signing and Encryption (JOSE)
//!
//! JWA identifiers, JWK EC key material and the JWE encryption engine.

pub mod jwa;
pub mod jwe;
pub mod jwk;
