//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs each delivery with the shared secret and sends the result in
//! the `X-Hub-Signature-256` header as `sha256=<hex>`. Parsing the header and
//! checking the digest are separate steps: a header we cannot understand is a
//! client error (400), while a digest that does not match is an authentication
//! failure (401).

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// The only algorithm name accepted in the signature header.
pub const SUPPORTED_ALGORITHM: &str = "sha256";

/// Errors from parsing the signature header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureHeaderError {
    /// The value did not split into exactly `<algorithm>=<digest>`.
    #[error("expected `<algorithm>=<digest>`, got {0:?}")]
    Malformed(String),

    /// The algorithm name was something other than `sha256`.
    #[error("unsupported signature algorithm {0:?}")]
    UnsupportedAlgorithm(String),
}

/// A parsed `X-Hub-Signature-256` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    algorithm: String,
    digest: String,
}

impl SignatureHeader {
    /// Parses a header value such as `sha256=abc123`.
    ///
    /// The value must contain exactly one `=`. Only `sha256` is accepted as
    /// the algorithm name. The digest is not validated here; a digest that is
    /// not hex simply fails verification later.
    ///
    /// # Examples
    ///
    /// ```
    /// use tag_sync_hook::webhooks::SignatureHeader;
    ///
    /// let header = SignatureHeader::parse("sha256=abc123").unwrap();
    /// assert_eq!(header.algorithm(), "sha256");
    /// assert_eq!(header.digest(), "abc123");
    ///
    /// assert!(SignatureHeader::parse("sha1=abc123").is_err());
    /// assert!(SignatureHeader::parse("abc123").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, SignatureHeaderError> {
        let mut parts = value.split('=');
        let (algorithm, digest) = match (parts.next(), parts.next(), parts.next()) {
            (Some(algorithm), Some(digest), None) => (algorithm, digest),
            _ => return Err(SignatureHeaderError::Malformed(value.to_string())),
        };

        if algorithm != SUPPORTED_ALGORITHM {
            return Err(SignatureHeaderError::UnsupportedAlgorithm(
                algorithm.to_string(),
            ));
        }

        Ok(SignatureHeader {
            algorithm: algorithm.to_string(),
            digest: digest.to_string(),
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The claimed hex digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.algorithm, self.digest)
    }
}

/// Computes the HMAC-SHA256 of `body` keyed with `secret`.
pub fn compute_signature(body: &[u8], secret: &[u8]) -> Vec<u8> {
    new_mac(secret, body).finalize().into_bytes().to_vec()
}

/// Formats raw signature bytes as a header value, `sha256=<lowercase hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{}={}", SUPPORTED_ALGORITHM, hex::encode(signature))
}

/// Checks `claimed_hex` against the HMAC-SHA256 of `body` under `secret`.
///
/// The digest must be exactly the lowercase hex that [`format_signature_header`]
/// produces; any other spelling never matches. The comparison itself runs in
/// constant time over the full digest (delegated to [`Mac::verify_slice`]).
/// Mismatch is a normal outcome and returns `false`.
///
/// # Examples
///
/// ```
/// use tag_sync_hook::webhooks::{compute_signature, verify};
///
/// let secret = b"It's a Secret to Everybody";
/// let body = b"Hello, World!";
/// let digest = hex::encode(compute_signature(body, secret));
///
/// assert!(verify(secret, body, &digest));
/// assert!(!verify(b"another secret", body, &digest));
/// ```
pub fn verify(secret: &[u8], body: &[u8], claimed_hex: &str) -> bool {
    let matches = is_lowercase_hex_digest(claimed_hex)
        && match hex::decode(claimed_hex) {
            Ok(claimed) => new_mac(secret, body).verify_slice(&claimed).is_ok(),
            Err(_) => false,
        };

    debug!(matches, "checked webhook signature");
    matches
}

/// Length of a hex-encoded SHA-256 digest.
const HEX_DIGEST_LEN: usize = 64;

fn is_lowercase_hex_digest(value: &str) -> bool {
    value.len() == HEX_DIGEST_LEN
        && value
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn new_mac(secret: &[u8], body: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body);
    mac
}
