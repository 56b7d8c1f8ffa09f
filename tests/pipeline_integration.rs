//! Integration tests for the full pipeline.
//!
//! These tests drive the public API (intake, workers, drain) against mock
//! HTTP servers, with a scripted extractor standing in for page scanning.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patreon_dl::clipboard::ScriptedClipboard;
use patreon_dl::extract::{ExtractError, Extraction, Extractor};
use patreon_dl::progress::NoopSink;
use patreon_dl::{
    Admission, Completion, DrainReason, HttpClient, Pipeline, PipelineConfig, RetryPolicy,
    spawn_clipboard_poller,
};

/// Extractor scripted per page URL; unknown pages yield nothing.
struct ScriptedExtractor {
    pages: HashMap<String, Extraction>,
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(
        &self,
        page_url: &str,
        _render_wait: Duration,
    ) -> Result<Extraction, ExtractError> {
        Ok(self.pages.get(page_url).cloned().unwrap_or_default())
    }
}

fn config(dir: &TempDir, concurrency: usize) -> PipelineConfig {
    PipelineConfig {
        concurrency,
        output_dir: dir.path().to_path_buf(),
        render_wait: Duration::ZERO,
    }
}

fn client() -> HttpClient {
    HttpClient::new(RetryPolicy::with_max_attempts(1))
}

async fn mount_file(server: &MockServer, route: &str, name: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Content-Disposition",
                    format!(r#"attachment; filename="{name}""#).as_str(),
                )
                .insert_header("Content-Length", body.len().to_string().as_str())
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("file should exist")
}

#[tokio::test]
async fn test_mixed_batch_downloads_deduplicates_and_finishes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_file(&server, "/one", "one.bin", b"first file").await;
    mount_file(&server, "/two", "two.bin", b"second file").await;
    mount_file(&server, "/shared", "shared.bin", b"linked from both pages").await;

    let page_a = "https://www.patreon.com/posts/first-post-1";
    let page_b = "https://www.patreon.com/posts/second-post-2";
    let extractor = ScriptedExtractor {
        pages: HashMap::from([
            (
                page_a.to_string(),
                Extraction {
                    files: vec![
                        format!("{}/one", server.uri()),
                        format!("{}/shared", server.uri()),
                    ],
                    label: Some("Creator A".to_string()),
                },
            ),
            (
                page_b.to_string(),
                Extraction {
                    files: vec![
                        format!("{}/two", server.uri()),
                        format!("{}/shared", server.uri()),
                    ],
                    label: Some("Creator B".to_string()),
                },
            ),
        ]),
    };

    let pipeline = Pipeline::start(
        &config(&dir, 3),
        client(),
        Arc::new(extractor),
        Arc::new(NoopSink),
    );
    let intake = pipeline.intake();

    assert_eq!(intake.admit(page_a, false), Admission::QueuedPage);
    assert_eq!(intake.admit(page_b, false), Admission::QueuedPage);
    // Resubmitting a page is a duplicate
    assert_eq!(intake.admit(page_a, false), Admission::Duplicate);
    // Junk is ignored without poisoning the run
    assert_eq!(
        intake.admit("https://example.com/unrelated", false),
        Admission::Unrecognized
    );

    pipeline.wait_until_idle().await;
    let completion = pipeline.drain(DrainReason::Idle).await;
    assert_eq!(completion, Completion::Finished);

    assert_eq!(read(&dir.path().join("Creator A/one.bin")), b"first file");
    assert_eq!(read(&dir.path().join("Creator B/two.bin")), b"second file");

    // The shared file downloaded exactly once, under whichever page won
    let in_a = dir.path().join("Creator A/shared.bin").exists();
    let in_b = dir.path().join("Creator B/shared.bin").exists();
    assert!(in_a ^ in_b, "shared file should land in exactly one group");

    // 2 pages + 3 distinct files
    assert_eq!(intake.seen(), 5);
}

#[tokio::test]
async fn test_interrupted_transfer_resumes_on_rerun() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let body: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

    // Ranged request continues exactly where the staging file stops
    Mock::given(method("GET"))
        .and(path("/track"))
        .and(wiremock::matchers::header("Range", "bytes=400-"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Disposition", r#"attachment; filename="track.flac""#)
                .insert_header("Content-Length", "600")
                .set_body_bytes(body[400..].to_vec()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/track"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", r#"attachment; filename="track.flac""#)
                .insert_header("Content-Length", "1000")
                .set_body_bytes(body.clone()),
        )
        .mount(&server)
        .await;

    // A previous run got 40% of the way
    let group = dir.path().join("Creator");
    std::fs::create_dir_all(&group).unwrap();
    std::fs::write(group.join("track.flac.part"), &body[..400]).unwrap();

    let page = "https://www.patreon.com/posts/resume-me-9";
    let extractor = ScriptedExtractor {
        pages: HashMap::from([(
            page.to_string(),
            Extraction {
                files: vec![format!("{}/track", server.uri())],
                label: Some("Creator".to_string()),
            },
        )]),
    };
    let pipeline = Pipeline::start(
        &config(&dir, 1),
        client(),
        Arc::new(extractor),
        Arc::new(NoopSink),
    );
    pipeline.intake().admit(page, false);

    pipeline.wait_until_idle().await;
    assert_eq!(pipeline.drain(DrainReason::Idle).await, Completion::Finished);

    assert_eq!(read(&group.join("track.flac")), body);
    assert!(!group.join("track.flac.part").exists());
}

#[tokio::test]
async fn test_interrupt_keeps_staging_and_reports_interrupted() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Body delayed long enough for the interrupt to land first
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", r#"attachment; filename="slow.bin""#)
                .insert_header("Content-Length", "8")
                .set_body_bytes(b"too slow".to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let page = "https://www.patreon.com/posts/slow-post-3";
    let extractor = ScriptedExtractor {
        pages: HashMap::from([(
            page.to_string(),
            Extraction {
                files: vec![format!("{}/slow", server.uri())],
                label: None,
            },
        )]),
    };
    let pipeline = Pipeline::start(
        &config(&dir, 1),
        client(),
        Arc::new(extractor),
        Arc::new(NoopSink),
    );
    pipeline.intake().admit(page, false);

    // Let extraction queue the job and the transfer begin
    tokio::time::sleep(Duration::from_millis(150)).await;
    pipeline.shutdown_signal().set();

    let completion = pipeline.drain(DrainReason::Interrupt).await;
    assert_eq!(completion, Completion::Interrupted);

    // No file may appear at the final name after an interrupt
    assert!(!dir.path().join("Misc/slow.bin").exists());
}

#[tokio::test]
async fn test_scripted_input_force_admits_and_downloads() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_file(&server, "/one", "one.bin", b"pasted").await;

    let page = "https://www.patreon.com/posts/pasted-post-7";
    let extractor = ScriptedExtractor {
        pages: HashMap::from([(
            page.to_string(),
            Extraction {
                files: vec![format!("{}/one", server.uri())],
                label: None,
            },
        )]),
    };
    let pipeline = Pipeline::start(
        &config(&dir, 1),
        client(),
        Arc::new(extractor),
        Arc::new(NoopSink),
    );

    // One paste holding a recognized URL between junk tokens
    let source = ScriptedClipboard::new([format!(
        "look at this {page} and this https://example.com/nope"
    )]);
    let poller = spawn_clipboard_poller(source, pipeline.intake(), pipeline.shutdown_signal());

    // Poll interval is one second; give the poller time to pick it up
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while pipeline.intake().seen() < 2 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "pasted page never flowed through the pipeline"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    pipeline.wait_until_idle().await;
    assert_eq!(pipeline.drain(DrainReason::Idle).await, Completion::Finished);
    let _ = poller.await;

    assert_eq!(read(&dir.path().join("Misc/one.bin")), b"pasted");
}
