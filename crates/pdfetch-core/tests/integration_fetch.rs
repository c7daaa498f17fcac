//! Integration tests: the curl pipeline against a local HTTP server.
//!
//! Every failing case also checks that neither the artifact nor its `.part`
//! file is left on disk.

mod common;

use common::pdf_server::{self, Route};
use pdfetch_core::config::FetchConfig;
use pdfetch_core::fallback::resolve_record;
use pdfetch_core::fetch::{CurlFetcher, FetchError, FetchJob, FetchReport, Fetcher};
use pdfetch_core::ledger::EntryStatus;
use pdfetch_core::progress::{ProgressSink, WorkerSlot};
use pdfetch_core::source::Record;
use pdfetch_core::storage::temp_path;
use std::path::Path;
use tempfile::tempdir;

fn test_config() -> FetchConfig {
    FetchConfig {
        probe_timeout_secs: 5,
        connect_timeout_secs: 5,
        transfer_timeout_secs: 10,
        min_free_bytes: 0,
        ..FetchConfig::default()
    }
}

fn fetch_with(cfg: FetchConfig, url: &str, dest: &Path) -> Result<FetchReport, FetchError> {
    let progress = ProgressSink::disconnected();
    let job = FetchJob {
        record_id: "T1",
        slot: WorkerSlot { worker_id: 1 },
        progress: &progress,
    };
    CurlFetcher::new(cfg).fetch(url, dest, &job)
}

fn assert_nothing_left(dest: &Path) {
    assert!(!dest.exists(), "artifact must not exist after failure");
    assert!(!temp_path(dest).exists(), ".part file must not remain");
}

#[test]
fn valid_pdf_is_downloaded_and_validated() {
    let body = common::sample_pdf();
    let server = pdf_server::start(vec![Route::pdf("/doc.pdf", body.clone())]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");

    let report = fetch_with(test_config(), &server.url("/doc.pdf"), &dest).expect("fetch");
    assert_eq!(report.bytes, body.len() as u64);
    assert_eq!(report.pages, 1);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert!(!temp_path(&dest).exists());
}

#[test]
fn html_body_fails_signature_gate() {
    let server = pdf_server::start(vec![Route::html("/page", common::html_page())]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");

    let err = fetch_with(test_config(), &server.url("/page"), &dest).unwrap_err();
    assert_eq!(err, FetchError::NotAPdf);
    assert_nothing_left(&dest);
}

#[test]
fn empty_body_is_rejected() {
    let server = pdf_server::start(vec![Route::pdf("/empty.pdf", Vec::new())]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");

    let err = fetch_with(test_config(), &server.url("/empty.pdf"), &dest).unwrap_err();
    assert_eq!(err, FetchError::EmptyFile);
    assert_nothing_left(&dest);
}

#[test]
fn corrupt_pdf_reports_parser_message() {
    let server = pdf_server::start(vec![Route::pdf("/corrupt.pdf", common::corrupt_pdf())]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");

    let err = fetch_with(test_config(), &server.url("/corrupt.pdf"), &dest).unwrap_err();
    match err {
        FetchError::StructuralError(msg) => assert!(!msg.is_empty()),
        other => panic!("expected StructuralError, got {:?}", other),
    }
    assert_nothing_left(&dest);
}

#[test]
fn stale_artifact_is_removed_when_attempt_fails() {
    let server = pdf_server::start(vec![Route::html("/page", common::html_page())]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");
    std::fs::write(&dest, b"left over from a crash").unwrap();

    assert!(fetch_with(test_config(), &server.url("/page"), &dest).is_err());
    assert_nothing_left(&dest);
}

#[test]
fn browser_user_agent_gets_through() {
    let server = pdf_server::start(vec![Route::pdf("/ua.pdf", common::sample_pdf()).browser_only()]);
    let dir = tempdir().unwrap();

    let dest = dir.path().join("ok.pdf");
    fetch_with(test_config(), &server.url("/ua.pdf"), &dest).expect("browser UA accepted");
    assert!(dest.exists());

    let bare = FetchConfig {
        user_agent: String::new(),
        ..test_config()
    };
    let dest = dir.path().join("denied.pdf");
    let err = fetch_with(bare, &server.url("/ua.pdf"), &dest).unwrap_err();
    match err {
        FetchError::TransferError(msg) => assert!(msg.contains("403"), "{}", msg),
        other => panic!("expected TransferError, got {:?}", other),
    }
    assert_nothing_left(&dest);
}

#[test]
fn url_without_scheme_is_fetched_over_http() {
    let server = pdf_server::start(vec![Route::pdf("/doc.pdf", common::sample_pdf())]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");
    let bare = server.url("/doc.pdf").trim_start_matches("http://").to_string();

    fetch_with(test_config(), &bare, &dest).expect("scheme added");
    assert!(dest.exists());
}

#[test]
fn head_rejection_does_not_block_download() {
    let server = pdf_server::start(vec![Route::pdf("/nohead.pdf", common::sample_pdf()).without_head()]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");

    fetch_with(test_config(), &server.url("/nohead.pdf"), &dest).expect("GET still attempted");
    assert!(dest.exists());
    assert_eq!(server.hits("/nohead.pdf"), 2);
}

#[test]
fn http_404_is_a_transfer_error() {
    let server = pdf_server::start(vec![]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");

    let err = fetch_with(test_config(), &server.url("/missing.pdf"), &dest).unwrap_err();
    assert!(matches!(err, FetchError::TransferError(_)), "{:?}", err);
    assert_nothing_left(&dest);
}

#[test]
fn invalid_url_fails_before_any_request() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");
    let err = fetch_with(test_config(), "http://", &dest).unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)), "{:?}", err);
}

#[test]
fn low_disk_space_is_reported() {
    let server = pdf_server::start(vec![Route::pdf("/doc.pdf", common::sample_pdf())]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("T1.pdf");
    let cfg = FetchConfig {
        min_free_bytes: u64::MAX,
        ..test_config()
    };

    let err = fetch_with(cfg, &server.url("/doc.pdf"), &dest).unwrap_err();
    assert!(matches!(err, FetchError::InsufficientSpace(_)), "{:?}", err);
    assert_eq!(server.total_hits(), 0);
    assert_nothing_left(&dest);
}

#[test]
fn secondary_is_untouched_when_primary_succeeds() {
    let server = pdf_server::start(vec![
        Route::pdf("/primary.pdf", common::sample_pdf()),
        Route::pdf("/secondary.pdf", common::sample_pdf()),
    ]);
    let dir = tempdir().unwrap();
    let record = Record {
        id: "BR42".to_string(),
        primary_link: Some(server.url("/primary.pdf")),
        secondary_link: Some(server.url("/secondary.pdf")),
    };

    let outcome = resolve_record(
        &record,
        &CurlFetcher::new(test_config()),
        dir.path(),
        WorkerSlot { worker_id: 1 },
        &ProgressSink::disconnected(),
    );
    assert_eq!(outcome.status, EntryStatus::Success);
    assert_eq!(outcome.detail, "Primary link OK");
    assert_eq!(server.hits("/secondary.pdf"), 0);
    assert!(dir.path().join("BR42.pdf").exists());
}

#[test]
fn html_primary_falls_back_to_pdf_secondary() {
    let server = pdf_server::start(vec![
        Route::html("/report.html", common::html_page()),
        Route::pdf("/report.pdf", common::sample_pdf()),
    ]);
    let dir = tempdir().unwrap();
    let record = Record {
        id: "BR43".to_string(),
        primary_link: Some(server.url("/report.html")),
        secondary_link: Some(server.url("/report.pdf")),
    };

    let outcome = resolve_record(
        &record,
        &CurlFetcher::new(test_config()),
        dir.path(),
        WorkerSlot { worker_id: 1 },
        &ProgressSink::disconnected(),
    );
    assert_eq!(outcome.status, EntryStatus::Success);
    assert_eq!(
        outcome.detail,
        "Secondary link OK (primary failed: No %PDF- signature in the initial data)"
    );
    assert!(dir.path().join("BR43.pdf").exists());
}
