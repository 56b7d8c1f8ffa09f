//! Filename derivation and path sanitization for downloads.
//!
//! The final filename comes from the server's Content-Disposition header,
//! never from the input URL (file URLs carry only opaque query parameters).

use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};

use super::constants::DEFAULT_FILENAME;

/// RFC 5987 encoded filename parameter: `filename*=utf-8''<pct-encoded>`.
#[allow(clippy::expect_used)]
static FILENAME_EXT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)filename\*=utf-8''([^;]+)").expect("filename* regex is valid")
});

/// Plain quoted filename parameter: `filename="<name>"`.
#[allow(clippy::expect_used)]
static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename="([^"]+)""#).expect("filename regex is valid"));

/// Extracts a filename from a Content-Disposition header value.
///
/// Preference order: the UTF-8 `filename*` parameter (percent-decoded), then
/// the quoted `filename` parameter. Returns `None` when neither is present.
#[must_use]
pub fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(captures) = FILENAME_EXT_PATTERN.captures(header) {
        let encoded = captures.get(1)?.as_str().trim();
        if let Ok(decoded) = urlencoding::decode(encoded) {
            return Some(decoded.into_owned());
        }
    }

    FILENAME_PATTERN
        .captures(header)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

/// Derives the output filename from response headers, already sanitized.
///
/// Falls back to a fixed default when the header is absent or yields nothing.
#[must_use]
pub fn filename_from_headers(headers: &HeaderMap) -> String {
    let name = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition)
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    sanitize(&name)
}

/// Replaces characters reserved by common filesystems with `_`.
///
/// Applied to both the creator subdirectory name and the filename.
#[must_use]
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}
