//! HttpDataService against an in-process storage API

mod support;

use pretty_assertions::assert_eq;
use rainsheet::client::{DataService, HttpDataService, UploadFile};
use rainsheet::config::ClientConfig;
use rainsheet::error::ViewerError;
use serde_json::json;
use std::time::Duration;
use support::{dead_url, rainfall_rows, write_workbook, MockBackend};
use tempfile::TempDir;

fn client(base_url: &str) -> HttpDataService {
    HttpDataService::new(ClientConfig::new(base_url, Duration::from_secs(5)).unwrap())
}

// ═══════════════════════════════════════════════════════════════════════════
// LISTING
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread")]
async fn test_list_files_empty() {
    let backend = MockBackend::start();
    let files = client(&backend.base_url).list_files().await.unwrap();
    assert!(files.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_files_and_sheets() {
    let backend = MockBackend::start();
    backend.seed(
        "hujan.xlsx",
        vec![("Januari", rainfall_rows()), ("Februari", json!([]))],
    );
    let service = client(&backend.base_url);

    assert_eq!(service.list_files().await.unwrap(), vec!["hujan.xlsx"]);
    assert_eq!(
        service.list_sheets("hujan.xlsx").await.unwrap(),
        vec!["Januari", "Februari"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_names_with_spaces_are_encoded() {
    let backend = MockBackend::start();
    backend.seed("curah hujan 2024.xlsx", vec![("Data Harian", rainfall_rows())]);
    let service = client(&backend.base_url);

    let sheets = service.list_sheets("curah hujan 2024.xlsx").await.unwrap();
    assert_eq!(sheets, vec!["Data Harian"]);
    let rows = service
        .fetch_rows("curah hujan 2024.xlsx", "Data Harian")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// ROWS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_rows_keeps_column_order() {
    let backend = MockBackend::start();
    backend.seed("hujan.xlsx", vec![("Januari", rainfall_rows())]);
    let rows = client(&backend.base_url)
        .fetch_rows("hujan.xlsx", "Januari")
        .await
        .unwrap();

    assert_eq!(
        rows.first_row_columns(),
        vec!["no_das", "nama_das", "luas_das", "hari1", "catatan"]
    );
    assert_eq!(rows.rows()[1]["hari1"], json!(5));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_rows_unknown_sheet_is_status_error() {
    let backend = MockBackend::start();
    backend.seed("hujan.xlsx", vec![("Januari", rainfall_rows())]);
    let err = client(&backend.base_url)
        .fetch_rows("hujan.xlsx", "Desember")
        .await
        .unwrap_err();
    assert!(matches!(err, ViewerError::Status { code: 404, .. }));
    assert!(err.is_fetch_failure());
}

// ═══════════════════════════════════════════════════════════════════════════
// UPLOAD
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_then_browse() {
    let backend = MockBackend::start();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hujan.xlsx");
    write_workbook(
        &path,
        "Januari",
        &["no_das", "nama_das", "hari1"],
        &[
            vec![json!(1), json!("Ciliwung"), json!(12)],
            vec![json!(2), json!("Cisadane"), json!(7.5)],
        ],
    );

    let service = client(&backend.base_url);
    let receipt = service
        .upload(UploadFile::from_path(&path).unwrap())
        .await
        .unwrap();
    assert_eq!(receipt["file"], "hujan.xlsx");

    assert_eq!(service.list_files().await.unwrap(), vec!["hujan.xlsx"]);
    assert_eq!(service.list_sheets("hujan.xlsx").await.unwrap(), vec!["Januari"]);

    let rows = service.fetch_rows("hujan.xlsx", "Januari").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.first_row_columns(), vec!["no_das", "nama_das", "hari1"]);
    assert_eq!(rows.rows()[0]["nama_das"], "Ciliwung");
    assert_eq!(rows.rows()[1]["hari1"], json!(7.5));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_rejected() {
    let backend = MockBackend::start();
    let err = client(&backend.base_url)
        .upload(UploadFile::new("notes.txt", b"just text".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, ViewerError::Status { code: 400, .. }));
}

// ═══════════════════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_body_is_decode_error() {
    let backend = MockBackend::start();
    let err = client(&backend.base_url)
        .list_sheets("broken.xlsx")
        .await
        .unwrap_err();
    assert!(matches!(err, ViewerError::Decode { .. }));
    assert!(err.is_fetch_failure());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_api_is_transport_error() {
    let err = client(&dead_url()).list_files().await.unwrap_err();
    assert!(matches!(err, ViewerError::Transport { .. }));
    assert!(err.is_fetch_failure());
}
