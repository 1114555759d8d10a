// Request signing for the Dyness open API
//
// Every call is authenticated with an HMAC-SHA1 signature over a
// five-field string-to-sign. The remote service recomputes the same
// signature from the headers it receives, so the serialized body bytes
// used for the Content-MD5 digest must be byte-identical to the bytes
// sent on the wire. All functions here are pure; the client supplies
// the body bytes and the current time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;

/// The only HTTP method the Dyness API accepts.
pub const METHOD: &str = "POST";

/// Content type as it appears in the string-to-sign (no charset suffix).
pub const SIGNED_CONTENT_TYPE: &str = "application/json";

/// Content type sent on the wire.
pub const WIRE_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Base64 of the raw MD5 digest of the serialized body bytes.
///
/// Note: the *raw* 16-byte digest is encoded, not its hex form.
pub fn content_md5(body: &[u8]) -> String {
    use md5::Digest;
    let digest = Md5::digest(body);
    STANDARD.encode(digest)
}

/// Format a timestamp for the `Date` header: `Mon, 01 Jan 2024 00:00:00 GMT`.
///
/// Always UTC; the literal `GMT` suffix is part of the signed string.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the five-field string-to-sign.
///
/// Field order is fixed by the protocol: method, content digest,
/// content type, date, request path — joined by `\n`.
pub fn string_to_sign(md5: &str, date: &str, path: &str) -> String {
    format!("{METHOD}\n{md5}\n{SIGNED_CONTENT_TYPE}\n{date}\n{path}")
}

/// Base64 of the raw HMAC-SHA1 of `string_to_sign`, keyed by the API secret.
pub fn signature(secret: &str, string_to_sign: &str) -> String {
    // HMAC accepts keys of any length; new_from_slice cannot fail.
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(string_to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// The `Authorization` header value: `API {api_id}:{signature}`.
pub fn authorization(api_id: &str, signature: &str) -> String {
    format!("API {api_id}:{signature}")
}
