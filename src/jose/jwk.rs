//! # JSON Web Key (JWK) — Elliptic Curve
//!
//! A JWK ([RFC7517]) is a JSON representation of a cryptographic key. This
//! module provides the Elliptic Curve key type used by the JWE engine:
//! the named-curve registry and the immutable EC key value object, with
//! JSON (de)serialization and export to native RustCrypto key types.
//!
//! Example JSON object representation of a public EC JWK:
//!
//! ```json
//! {
//!   "kty": "EC",
//!   "crv": "P-256",
//!   "x": "MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4",
//!   "y": "4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM",
//!   "use": "enc",
//!   "kid": "1"
//! }
//! ```
//!
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named cryptographic curve: the JOSE name plus, for the well-known NIST
/// curves, the standard (SEC 2) curve name used for parameter lookup.
///
/// The well-known curves are shared constants; parsing any other name yields
/// an ad-hoc curve with no standard name. Equality and hashing compare the
/// JOSE name only, regardless of which variant carries it.
#[derive(Clone, Debug, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Curve {
    /// P-256 curve (secp256r1).
    P256,

    /// P-384 curve (secp384r1).
    P384,

    /// P-521 curve (secp521r1).
    P521,

    /// A curve known only by its JOSE name. Has no standard name and cannot
    /// be resolved to curve parameters.
    Other(String),
}

impl Curve {
    /// Parses a curve from its JOSE name. Never fails: an unrecognized name
    /// yields an ad-hoc [`Curve::Other`] with no standard name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "P-256" => Self::P256,
            "P-384" => Self::P384,
            "P-521" => Self::P521,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Reverse lookup of a well-known curve by its standard (SEC 2) name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Crypto` if no well-known curve has that standard
    /// name.
    pub fn from_std_name(std_name: &str) -> Result<Self> {
        match std_name {
            "secp256r1" => Ok(Self::P256),
            "secp384r1" => Ok(Self::P384),
            "secp521r1" => Ok(Self::P521),
            _ => Err(Error::Crypto(format!(
                "no matching curve for standard name {std_name}"
            ))),
        }
    }

    /// The JOSE name of the curve.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
            Self::Other(name) => name,
        }
    }

    /// The standard (SEC 2) name of the curve, `None` for ad-hoc curves.
    #[must_use]
    pub const fn std_name(&self) -> Option<&'static str> {
        match self {
            Self::P256 => Some("secp256r1"),
            Self::P384 => Some("secp384r1"),
            Self::P521 => Some("secp521r1"),
            Self::Other(_) => None,
        }
    }
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Hash for Curve {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<String> for Curve {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<Curve> for String {
    fn from(crv: Curve) -> Self {
        crv.name().to_string()
    }
}

/// Cryptographic key type (the JWK `kty` parameter).
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyType {
    /// Elliptic curve key pair.
    #[default]
    #[serde(rename = "EC")]
    Ec,

    /// Octet key pair (Edwards curve).
    #[serde(rename = "OKP")]
    Okp,

    /// Octet string.
    #[serde(rename = "oct")]
    Oct,
}

/// The intended usage of the key (the JWK `use` parameter).
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum KeyUse {
    /// Key is to be used for signature verification.
    #[default]
    #[serde(rename = "sig")]
    Signature,

    /// Key is to be used for encryption.
    #[serde(rename = "enc")]
    Encryption,
}

/// Public and private Elliptic Curve JSON Web Key. Immutable once
/// constructed: `x` and `y` are always present, `d` is present iff the key
/// is private.
///
/// Coordinates are held as Base64URL encodings of their unsigned big-endian
/// byte representation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct EcKey {
    /// Key type. Always [`KeyType::Ec`].
    kty: KeyType,

    /// Intended use of the key.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    use_: Option<KeyUse>,

    /// Intended JOSE algorithm for the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    alg: Option<String>,

    /// Key identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<String>,

    /// Cryptographic curve.
    crv: Curve,

    /// Public 'x' coordinate.
    x: String,

    /// Public 'y' coordinate.
    y: String,

    /// Private 'd' coordinate. Absent for public keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    d: Option<String>,
}

impl EcKey {
    /// Creates a new public Elliptic Curve JWK.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a coordinate is absent (empty).
    pub fn new(crv: Curve, x: impl Into<String>, y: impl Into<String>) -> Result<Self> {
        let (x, y) = (x.into(), y.into());
        if x.is_empty() {
            return Err(Error::Validation("the x coordinate must not be absent".into()));
        }
        if y.is_empty() {
            return Err(Error::Validation("the y coordinate must not be absent".into()));
        }

        Ok(Self {
            kty: KeyType::Ec,
            use_: None,
            alg: None,
            kid: None,
            crv,
            x,
            y,
            d: None,
        })
    }

    /// Creates a new public/private Elliptic Curve JWK.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a public coordinate is absent.
    pub fn new_private(
        crv: Curve, x: impl Into<String>, y: impl Into<String>, d: impl Into<String>,
    ) -> Result<Self> {
        let mut key = Self::new(crv, x, y)?;
        key.d = Some(d.into());
        Ok(key)
    }

    /// Sets the intended key use.
    #[must_use]
    pub fn with_use(mut self, use_: KeyUse) -> Self {
        self.use_ = Some(use_);
        self
    }

    /// Sets the intended JOSE algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    /// Sets the key identifier.
    #[must_use]
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// The cryptographic curve.
    #[must_use]
    pub const fn curve(&self) -> &Curve {
        &self.crv
    }

    /// The public 'x' coordinate, Base64URL encoded.
    #[must_use]
    pub fn x(&self) -> &str {
        &self.x
    }

    /// The public 'y' coordinate, Base64URL encoded.
    #[must_use]
    pub fn y(&self) -> &str {
        &self.y
    }

    /// The private 'd' coordinate, `None` for a public key.
    #[must_use]
    pub fn d(&self) -> Option<&str> {
        self.d.as_deref()
    }

    /// The intended key use, if specified.
    #[must_use]
    pub const fn key_use(&self) -> Option<KeyUse> {
        self.use_
    }

    /// The intended JOSE algorithm, if specified.
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.alg.as_deref()
    }

    /// The key identifier, if specified.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// `true` if the key carries the private 'd' coordinate.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// Returns a copy of this JWK with any private values removed.
    #[must_use]
    pub fn to_public_jwk(&self) -> Self {
        let mut key = self.clone();
        key.d = None;
        key
    }

    /// Parses an EC JWK from its JSON object representation.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the JSON is malformed, a required member is
    /// missing, or `kty` is not `"EC"`.
    pub fn from_json(json: &str) -> Result<Self> {
        // kty outside the known set fails serde deserialization
        let key: Self = serde_json::from_str(json)
            .map_err(|e| Error::Parse(format!("issue deserializing EC JWK: {e}")))?;

        if key.kty != KeyType::Ec {
            return Err(Error::Parse("the key type \"kty\" must be EC".into()));
        }
        if key.x.is_empty() {
            return Err(Error::Parse("the x coordinate must not be absent".into()));
        }
        if key.y.is_empty() {
            return Err(Error::Parse("the y coordinate must not be absent".into()));
        }

        Ok(key)
    }

    /// Serializes this JWK to its JSON object representation: base members
    /// (`kty`, `use`, `alg`, `kid`) then `crv`, `x`, `y` and, for a private
    /// key, `d`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Parse(format!("issue serializing EC JWK: {e}")))
    }

    /// Exports the public part as a native elliptic-curve public key,
    /// resolving curve parameters through the standard-name registry.
    ///
    /// # Errors
    ///
    /// Returns `Error::Crypto` if the curve has no standard name, the
    /// registry has no parameters for it, or the coordinates do not encode
    /// a point on the curve.
    pub fn to_ec_public_key(&self) -> Result<EcPublicKey> {
        let std_name = self
            .crv
            .std_name()
            .ok_or_else(|| Error::Crypto("EC key curve has no specified standard name".into()))?;

        let x = decode_coordinate(&self.x, "x")?;
        let y = decode_coordinate(&self.y, "y")?;

        match std_name {
            "secp256r1" => {
                let sec1 = uncompressed_point(&x, &y, 32)?;
                p256::PublicKey::from_sec1_bytes(&sec1)
                    .map(EcPublicKey::P256)
                    .map_err(|e| Error::Crypto(format!("invalid P-256 public key: {e}")))
            }
            "secp384r1" => {
                let sec1 = uncompressed_point(&x, &y, 48)?;
                p384::PublicKey::from_sec1_bytes(&sec1)
                    .map(EcPublicKey::P384)
                    .map_err(|e| Error::Crypto(format!("invalid P-384 public key: {e}")))
            }
            "secp521r1" => {
                let sec1 = uncompressed_point(&x, &y, 66)?;
                p521::PublicKey::from_sec1_bytes(&sec1)
                    .map(EcPublicKey::P521)
                    .map_err(|e| Error::Crypto(format!("invalid P-521 public key: {e}")))
            }
            _ => Err(Error::Crypto(format!("no EC parameters for curve {std_name}"))),
        }
    }

    /// Exports the private part as a native elliptic-curve secret key, or
    /// `None` if this is a public key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Crypto` on curve parameter lookup failure or an
    /// out-of-range scalar.
    pub fn to_ec_private_key(&self) -> Result<Option<EcPrivateKey>> {
        let Some(d) = &self.d else {
            return Ok(None);
        };

        let std_name = self
            .crv
            .std_name()
            .ok_or_else(|| Error::Crypto("EC key curve has no specified standard name".into()))?;

        let d = decode_coordinate(d, "d")?;

        let key = match std_name {
            "secp256r1" => p256::SecretKey::from_slice(&left_pad(&d, 32)?)
                .map(EcPrivateKey::P256)
                .map_err(|e| Error::Crypto(format!("invalid P-256 private key: {e}")))?,
            "secp384r1" => p384::SecretKey::from_slice(&left_pad(&d, 48)?)
                .map(EcPrivateKey::P384)
                .map_err(|e| Error::Crypto(format!("invalid P-384 private key: {e}")))?,
            "secp521r1" => p521::SecretKey::from_slice(&left_pad(&d, 66)?)
                .map(EcPrivateKey::P521)
                .map_err(|e| Error::Crypto(format!("invalid P-521 private key: {e}")))?,
            _ => return Err(Error::Crypto(format!("no EC parameters for curve {std_name}"))),
        };

        Ok(Some(key))
    }

    /// Exports this JWK as a native key pair. The private key is `None` for
    /// a public-only JWK.
    ///
    /// # Errors
    ///
    /// Returns `Error::Crypto` if either export fails.
    pub fn to_key_pair(&self) -> Result<EcKeyPair> {
        Ok(EcKeyPair {
            public_key: self.to_ec_public_key()?,
            private_key: self.to_ec_private_key()?,
        })
    }
}

/// A native elliptic-curve public key for one of the well-known curves.
#[derive(Clone, Debug)]
pub enum EcPublicKey {
    /// P-256 public key.
    P256(p256::PublicKey),

    /// P-384 public key.
    P384(p384::PublicKey),

    /// P-521 public key.
    P521(p521::PublicKey),
}

/// A native elliptic-curve secret key for one of the well-known curves.
#[derive(Clone)]
pub enum EcPrivateKey {
    /// P-256 secret key.
    P256(p256::SecretKey),

    /// P-384 secret key.
    P384(p384::SecretKey),

    /// P-521 secret key.
    P521(p521::SecretKey),
}

/// A native elliptic-curve key pair.
#[derive(Clone)]
pub struct EcKeyPair {
    /// The public key.
    pub public_key: EcPublicKey,

    /// The secret key, `None` when exported from a public-only JWK.
    pub private_key: Option<EcPrivateKey>,
}

// Decode a Base64URL coordinate to its unsigned big-endian bytes.
fn decode_coordinate(encoded: &str, name: &str) -> Result<Vec<u8>> {
    Base64::decode_vec(encoded)
        .map_err(|e| Error::Crypto(format!("issue decoding {name} coordinate: {e}")))
}

// Left-pad an unsigned big-endian integer to the curve's field size.
fn left_pad(bytes: &[u8], size: usize) -> Result<Vec<u8>> {
    if bytes.len() > size {
        return Err(Error::Crypto(format!(
            "coordinate length {} exceeds field size {size}",
            bytes.len()
        )));
    }
    let mut padded = vec![0u8; size - bytes.len()];
    padded.extend_from_slice(bytes);
    Ok(padded)
}

// SEC 1 uncompressed point: 0x04 || X || Y, each padded to the field size.
fn uncompressed_point(x: &[u8], y: &[u8], size: usize) -> Result<Vec<u8>> {
    let mut point = Vec::with_capacity(1 + 2 * size);
    point.push(0x04);
    point.extend_from_slice(&left_pad(x, size)?);
    point.extend_from_slice(&left_pad(y, size)?);
    Ok(point)
}

impl FromStr for EcKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // P-256 key pair from RFC 7515 appendix A.3.
    const X: &str = "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU";
    const Y: &str = "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0";
    const D: &str = "jpsQnnGQmL-YBIffH1136cspYG6-0iY7X1fCE9-E9LI";

    #[test]
    fn curve_parse_well_known_is_shared() {
        let a = Curve::parse("P-256");
        let b = Curve::parse("P-256");
        assert!(matches!(a, Curve::P256));
        assert!(matches!(b, Curve::P256));
        assert_eq!(a, b);
        assert_eq!(a.std_name(), Some("secp256r1"));
    }

    #[test]
    fn curve_parse_unknown_never_fails() {
        let crv = Curve::parse("P-512");
        assert!(matches!(crv, Curve::Other(_)));
        assert_eq!(crv.name(), "P-512");
        assert!(crv.std_name().is_none());

        // equality is by name regardless of variant
        assert_eq!(Curve::Other("P-256".into()), Curve::P256);
        assert_ne!(crv, Curve::P521);
    }

    #[test]
    fn curve_from_std_name() {
        assert_eq!(Curve::from_std_name("secp384r1").expect("should resolve"), Curve::P384);

        let err = Curve::from_std_name("P-512").expect_err("should fail");
        assert!(matches!(err, Error::Crypto(_)));
    }

    #[test]
    fn public_key_round_trip() {
        let key = EcKey::new(Curve::P256, X, Y)
            .expect("should construct")
            .with_use(KeyUse::Encryption)
            .with_key_id("1");

        let json = key.to_json().expect("should serialize");
        let parsed = EcKey::from_json(&json).expect("should parse");

        assert_eq!(key, parsed);
        assert!(!parsed.is_private());
        assert_eq!(parsed.key_id(), Some("1"));
    }

    #[test]
    fn private_key_round_trip() {
        let key = EcKey::new_private(Curve::P256, X, Y, D).expect("should construct");
        let json = key.to_json().expect("should serialize");
        let parsed = EcKey::from_json(&json).expect("should parse");

        assert_eq!(key, parsed);
        assert!(parsed.is_private());
        assert_eq!(parsed.d(), Some(D));
    }

    #[test]
    fn serialized_member_order() {
        let key = EcKey::new(Curve::P256, X, Y)
            .expect("should construct")
            .with_use(KeyUse::Encryption)
            .with_key_id("1");

        let json = key.to_json().expect("should serialize");
        assert_eq!(
            json,
            format!(r#"{{"kty":"EC","use":"enc","kid":"1","crv":"P-256","x":"{X}","y":"{Y}"}}"#)
        );
    }

    #[test]
    fn to_public_jwk_clears_private_coordinate() {
        let key = EcKey::new_private(Curve::P256, X, Y, D).expect("should construct");
        let public = key.to_public_jwk();

        assert!(public.d().is_none());
        assert!(!public.is_private());
        assert_eq!(public.x(), key.x());
        assert_eq!(public.y(), key.y());
    }

    #[test]
    fn parse_rejects_wrong_key_type() {
        let json = format!(r#"{{"kty":"oct","crv":"P-256","x":"{X}","y":"{Y}"}}"#);
        let err = EcKey::from_json(&json).expect_err("should fail");
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("must be EC"));
    }

    #[test]
    fn export_to_native_key_pair() {
        let key = EcKey::new_private(Curve::P256, X, Y, D).expect("should construct");
        let pair = key.to_key_pair().expect("should export");

        assert!(matches!(pair.public_key, EcPublicKey::P256(_)));
        let Some(EcPrivateKey::P256(secret)) = pair.private_key else {
            panic!("should have P-256 private key");
        };

        // the private scalar must produce the public point
        let EcPublicKey::P256(public) = key.to_ec_public_key().expect("should export") else {
            panic!("should be P-256");
        };
        assert_eq!(secret.public_key(), public);
    }

    #[test]
    fn export_fails_for_ad_hoc_curve() {
        let key = EcKey::new(Curve::parse("P-512"), X, Y).expect("should construct");
        let err = key.to_ec_public_key().expect_err("should fail");
        assert!(matches!(err, Error::Crypto(_)));
        assert!(err.to_string().contains("no specified standard name"));
    }

    #[test]
    fn public_only_export_has_no_private_key() {
        let key = EcKey::new(Curve::P256, X, Y).expect("should construct");
        assert!(key.to_ec_private_key().expect("should export").is_none());
        assert!(key.to_key_pair().expect("should export").private_key.is_none());
    }

    #[test]
    fn construction_requires_coordinates() {
        let err = EcKey::new(Curve::P256, "", Y).expect_err("should fail");
        assert!(matches!(err, Error::Validation(_)));
    }
}
