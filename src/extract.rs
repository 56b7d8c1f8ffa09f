//! Post-page extraction: harvesting file URLs and the creator label.
//!
//! The pipeline talks to this stage through the [`Extractor`] trait so tests
//! can script extractions without network access. The shipped implementation,
//! [`PageScanExtractor`], fetches the post HTML and scans it for file URLs
//! and the creator's display name.

use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// File links inside a page body, `&` either raw or HTML-entity encoded.
#[allow(clippy::expect_used)]
static EMBEDDED_FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://www\.patreon\.com/file\?h=\d+(?:&|&amp;)m=\d+")
        .expect("embedded file regex is valid")
});

/// Creator display name embedded in the page's bootstrap JSON.
#[allow(clippy::expect_used)]
static CREATOR_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""full_name":\s*"([^"]+)""#).expect("creator regex is valid"));

/// Errors that can occur while fetching or scanning a post page.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Network-level failure fetching the page.
    #[error("failed to fetch page {url}: {source}")]
    Fetch {
        /// The page URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status for the page.
    #[error("HTTP {status} fetching page {url}")]
    HttpStatus {
        /// The page URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl ExtractError {
    /// Creates a fetch error from a reqwest error.
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }
}

/// What a page yielded: the file URLs found on it and the creator label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Distinct file URLs, normalized to raw `&` separators.
    pub files: Vec<String>,
    /// Creator display name, when the page exposes one.
    pub label: Option<String>,
}

/// Turns a post page URL into the file URLs it links to.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetches `page_url` and harvests its file links.
    ///
    /// `render_wait` is the settle time before harvesting, for
    /// implementations that execute page scripts.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the page cannot be fetched. A page that
    /// fetches fine but contains no file links is an empty `Ok` extraction,
    /// not an error.
    async fn extract(
        &self,
        page_url: &str,
        render_wait: Duration,
    ) -> Result<Extraction, ExtractError>;
}

/// Extractor that scans the raw page HTML.
///
/// Patreon embeds post attachments and the creator name in the served
/// document, so a plain GET is enough; no script execution happens and the
/// render wait is not needed.
#[derive(Debug, Clone)]
pub struct PageScanExtractor {
    client: Client,
}

impl PageScanExtractor {
    /// Creates an extractor sharing the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Extractor for PageScanExtractor {
    async fn extract(
        &self,
        page_url: &str,
        _render_wait: Duration,
    ) -> Result<Extraction, ExtractError> {
        let response = self
            .client
            .get(page_url)
            .send()
            .await
            .map_err(|e| ExtractError::fetch(page_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::http_status(page_url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractError::fetch(page_url, e))?;

        let extraction = scan_page(&body);
        debug!(
            page = page_url,
            files = extraction.files.len(),
            label = extraction.label.as_deref().unwrap_or("-"),
            "scanned page"
        );
        Ok(extraction)
    }
}

/// Harvests file URLs and the creator label from a page body.
///
/// Duplicate links within one page collapse to a single entry; order is
/// deterministic.
#[must_use]
pub fn scan_page(body: &str) -> Extraction {
    let files: BTreeSet<String> = EMBEDDED_FILE_PATTERN
        .find_iter(body)
        .map(|m| m.as_str().replace("&amp;", "&"))
        .collect();

    let label = CREATOR_NAME_PATTERN
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string());

    Extraction {
        files: files.into_iter().collect(),
        label,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <script>{"full_name": "Some Creator", "id": "123"}</script>
        <a href="https://www.patreon.com/file?h=11&amp;m=22">track one</a>
        <a href="https://www.patreon.com/file?h=11&amp;m=22">same track</a>
        <a href="https://www.patreon.com/file?h=33&m=44">track two</a>
        <a href="https://www.patreon.com/posts/other-post-55">another post</a>
        </body></html>
    "#;

    #[test]
    fn test_scan_page_harvests_and_normalizes_file_urls() {
        let extraction = scan_page(PAGE);
        assert_eq!(
            extraction.files,
            vec![
                "https://www.patreon.com/file?h=11&m=22".to_string(),
                "https://www.patreon.com/file?h=33&m=44".to_string(),
            ]
        );
    }

    #[test]
    fn test_scan_page_finds_creator_label() {
        let extraction = scan_page(PAGE);
        assert_eq!(extraction.label, Some("Some Creator".to_string()));
    }

    #[test]
    fn test_scan_page_empty_body() {
        let extraction = scan_page("<html><body>no links here</body></html>");
        assert!(extraction.files.is_empty());
        assert_eq!(extraction.label, None);
    }

    #[test]
    fn test_scan_page_ignores_malformed_file_urls() {
        let body = r#"
            <a href="https://www.patreon.com/file?h=abc&m=22">bad h</a>
            <a href="https://www.patreon.com/file?h=11">missing m</a>
        "#;
        assert!(scan_page(body).files.is_empty());
    }

    #[tokio::test]
    async fn test_page_scan_extractor_fetches_and_scans() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/my-post-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let extractor = PageScanExtractor::new(Client::new());
        let extraction = extractor
            .extract(
                &format!("{}/posts/my-post-1", server.uri()),
                Duration::ZERO,
            )
            .await
            .unwrap();

        assert_eq!(extraction.files.len(), 2);
        assert_eq!(extraction.label, Some("Some Creator".to_string()));
    }

    #[tokio::test]
    async fn test_page_scan_extractor_surfaces_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let extractor = PageScanExtractor::new(Client::new());
        let result = extractor
            .extract(&format!("{}/posts/gone", server.uri()), Duration::ZERO)
            .await;

        assert!(matches!(
            result,
            Err(ExtractError::HttpStatus { status: 404, .. })
        ));
    }
}
