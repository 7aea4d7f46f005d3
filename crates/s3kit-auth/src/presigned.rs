//! Pre-signed URL query assembly for query-string (V2) authentication.
//!
//! A pre-signed URL carries its authentication in three query parameters:
//!
//! - `AWSAccessKeyId` - The access key ID
//! - `Expires` - Absolute expiry as Unix seconds
//! - `Signature` - The base64 signature, form-URL-encoded
//!
//! The signature itself is produced by a [`crate::Signer`]; this module only
//! lays it out.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters left unescaped in an object key: RFC 3986 unreserved.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const ACCESS_KEY_PARAM: &str = "AWSAccessKeyId";
const EXPIRES_PARAM: &str = "Expires";
const SIGNATURE_PARAM: &str = "Signature";

/// Escape a raw object key for use in a URL path.
///
/// The key is taken literally: a `%` in the key is escaped like any other
/// reserved character. Everything outside the unreserved set is escaped
/// except path separators and `+`.
///
/// # Examples
///
/// ```
/// use s3kit_auth::encode_key;
///
/// assert_eq!(encode_key("photos/my cat.jpg"), "photos/my%20cat.jpg");
/// assert_eq!(encode_key("100%25 off"), "100%2525%20off");
/// ```
#[must_use]
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET)
        .to_string()
        .replace("%2F", "/")
        .replace("%2B", "+")
}

/// Normalize a key that may already be percent-encoded.
///
/// The key is percent-decoded first so callers may pass either raw or
/// encoded keys, then escaped with [`encode_key`]. Invalid UTF-8 after
/// decoding is replaced with U+FFFD.
///
/// ```
/// use s3kit_auth::normalize_key;
///
/// assert_eq!(normalize_key("photos%2Fcat.jpg"), "photos/cat.jpg");
/// assert_eq!(normalize_key("my%20cat.jpg"), normalize_key("my cat.jpg"));
/// ```
#[must_use]
pub fn normalize_key(key: &str) -> String {
    encode_key(&percent_decode_str(key).decode_utf8_lossy())
}

/// Authentication parameters of a pre-signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedParams {
    /// The access key ID.
    pub access_key_id: String,
    /// Absolute expiry in Unix seconds.
    pub expires: i64,
    /// The signature as returned by the signer.
    pub signature: String,
}

impl PresignedParams {
    /// Render as a query string: `AWSAccessKeyId=..&Expires=..&Signature=..`.
    ///
    /// `Expires` is written verbatim; the signature is form-URL-encoded.
    #[must_use]
    pub fn to_query(&self) -> String {
        format!(
            "{ACCESS_KEY_PARAM}={}&{EXPIRES_PARAM}={}&{SIGNATURE_PARAM}={}",
            form_encode(&self.access_key_id),
            self.expires,
            form_encode(&self.signature),
        )
    }
}

fn form_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
