//! URL classification for the two recognized input shapes.
//!
//! Every piece of input text (CLI arguments, pasted tokens, links harvested
//! from a post) goes through [`classify`] before it can enter a
//! queue. Exactly two shapes are recognized; everything else is ignored.

use std::sync::LazyLock;

use regex::Regex;

/// Direct file attachment shape: `https://www.patreon.com/file?h=<id>&m=<id>`.
///
/// Matched against the full string. A prefix/substring match would accept
/// URLs that merely embed the pattern (e.g. share links wrapping a file URL).
#[allow(clippy::expect_used)]
static FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.patreon\.com/file\?h=\d+&m=\d+$").expect("file regex is valid")
});

/// Post page shape: `https://www.patreon.com/posts/<slug>`.
///
/// Anchored at the start only: post URLs frequently carry trailing query
/// strings or fragments that do not affect identification.
#[allow(clippy::expect_used)]
static POST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.patreon\.com/posts/[\w-]+").expect("post regex is valid")
});

/// Result of classifying an input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// A direct file attachment reference, downloadable as-is.
    File,
    /// A post page from which file links and a creator label are extracted.
    Page,
}

/// Classifies a string as a file URL, a post page URL, or neither.
///
/// Pure and stable: the same input always yields the same result, with no
/// side effects, so it is callable concurrently without synchronization.
#[must_use]
pub fn classify(input: &str) -> Option<UrlKind> {
    let trimmed = input.trim();
    if FILE_PATTERN.is_match(trimmed) {
        Some(UrlKind::File)
    } else if POST_PATTERN.is_match(trimmed) {
        Some(UrlKind::Page)
    } else {
        None
    }
}
