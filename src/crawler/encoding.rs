//! Character-encoding resolution for fetched bodies
//!
//! Raw response bytes are turned into text in two passes:
//!
//! 1. A `charset=` token in the declared `Content-Type` header wins outright.
//! 2. Otherwise the body is decoded as UTF-8 and scanned for an embedded declaration
//!    (typically `<meta charset=...>`); a resolvable non-UTF-8 charset found there
//!    triggers a re-decode of the original bytes.
//!
//! Unknown or absent charsets fall back silently to UTF-8.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::OnceLock;

fn charset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)charset="*([\w-]+)"#).expect("charset pattern is a valid regex")
    })
}

/// Finds the first `charset=` token in `content` and resolves it to a known encoding
///
/// Returns `None` when there is no token or its label is not a known encoding.
/// Labels that map to the replacement encoding (ISO-2022-KR, HZ and friends) count as
/// unknown.
pub fn find_encoding(content: &str) -> Option<&'static Encoding> {
    let label = charset_pattern().captures(content)?.get(1)?.as_str();
    let encoding = Encoding::for_label_no_replacement(label.as_bytes());
    if encoding.is_none() {
        tracing::trace!("Ignoring unknown charset label: {}", label);
    }
    encoding
}

/// Decodes `bytes` into text using the declared content type or an embedded declaration
///
/// # Arguments
///
/// * `bytes` - The raw response body
/// * `content_type` - The `Content-Type` header value, if the response carried one
///
/// # Example
///
/// ```
/// use spider_engine::crawler::decode;
///
/// let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode("Привет");
/// assert_eq!(decode(&bytes, Some("text/html; charset=windows-1251")), "Привет");
/// ```
pub fn decode(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type.and_then(find_encoding) {
        return decode_with(encoding, bytes);
    }

    let text = decode_with(UTF_8, bytes);
    match find_encoding(&text) {
        Some(encoding) if encoding != UTF_8 => {
            tracing::debug!("Re-decoding body as {} from embedded charset", encoding.name());
            decode_with(encoding, bytes)
        }
        _ => text,
    }
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> String {
    encoding.decode_without_bom_handling(bytes).0.into_owned()
}
