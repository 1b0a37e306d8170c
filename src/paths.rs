//! Escaping of bucket names, keys and prefixes placed in request paths.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except unreserved characters and `/` is percent-encoded, so
/// nested keys keep their slashes while `?`, `#`, `%` and spaces stay part of
/// the path.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode `raw` for use inside a URL path.
pub fn encode_path(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_ENCODE_SET).to_string()
}

/// `api/bucket/{action}/{bucket}/{key}` with both parts escaped.
pub fn object_path(action: &str, bucket: &str, key: &str) -> String {
    format!(
        "api/bucket/{}/{}/{}",
        action,
        encode_path(bucket),
        encode_path(key)
    )
}
