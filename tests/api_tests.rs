//! API integration tests
//!
//! Requests go through the real router with `tower::ServiceExt::oneshot`;
//! each test gets its own database and upload directory.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use royalbit_intake::api::build_router;
use royalbit_intake::api::server::{ApiConfig, AppState};
use royalbit_intake::excel::{TemplateWriter, WorkbookReader};
use royalbit_intake::store::SqliteStore;
use rust_xlsxwriter::Workbook;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "intake-test-boundary";

// ═══════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════

fn app(dir: &TempDir, environment: &str) -> Router {
    let config = ApiConfig {
        database_path: dir.path().join("intake.db"),
        upload_dir: dir.path().join("uploads"),
        environment: environment.to_string(),
        ..ApiConfig::default()
    };
    build_router(Arc::new(AppState::from_config(&config)))
}

/// Workbook with the template headers and one row per NIF
fn workbook(headers: &[&str], nifs: &[&str]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let nif_col = headers.iter().position(|h| *h == "NIF");
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row, nif) in nifs.iter().enumerate() {
        let row = row as u32 + 1;
        if let Some(col) = nif_col {
            sheet.write_string(row, col as u16, *nif).unwrap();
        }
        // Column 0 holds the filing date in template order
        sheet.write_number(row, 0, 45000.0).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

fn multipart_request(field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"depots.xlsx\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn stored_count(dir: &Path) -> u64 {
    SqliteStore::open(&dir.join("intake.db"))
        .unwrap()
        .count()
        .unwrap()
}

fn template_headers() -> Vec<&'static str> {
    TemplateWriter::new().headers().to_vec()
}

// ═══════════════════════════════════════════════════════════════════════════
// INFO ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (status, json) = send_json(app(&dir, "development"), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_version_endpoint() {
    let dir = TempDir::new().unwrap();
    let (status, json) = send_json(app(&dir, "development"), get("/version")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_lists_import_endpoint() {
    let dir = TempDir::new().unwrap();
    let (status, json) = send_json(app(&dir, "development"), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    let endpoints = json["data"]["endpoints"].as_array().unwrap();
    assert!(endpoints.iter().any(|e| e["path"] == "/api/v1/import"));
}

// ═══════════════════════════════════════════════════════════════════════════
// IMPORT ENDPOINT
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_import_success() {
    let dir = TempDir::new().unwrap();
    let bytes = workbook(&template_headers(), &["111", "", "222"]);

    let (status, json) =
        send_json(app(&dir, "development"), multipart_request("file", &bytes)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["inserted_count"], 2);
    assert_eq!(json["data"]["total_count"], 2);
    assert_eq!(json["data"]["rows_read"], 3);
    assert_eq!(
        json["data"]["message"],
        "Import succeeded: 2/2 records inserted."
    );
    assert_eq!(stored_count(dir.path()), 2);
}

#[tokio::test]
async fn test_reimport_reports_zero_inserted() {
    let dir = TempDir::new().unwrap();
    let bytes = workbook(&template_headers(), &["111"]);

    send_json(app(&dir, "development"), multipart_request("file", &bytes)).await;
    let (status, json) =
        send_json(app(&dir, "development"), multipart_request("file", &bytes)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["inserted_count"], 0);
    assert_eq!(json["data"]["total_count"], 1);
    assert_eq!(stored_count(dir.path()), 1);
}

#[tokio::test]
async fn test_import_without_file_field() {
    let dir = TempDir::new().unwrap();
    let bytes = workbook(&template_headers(), &["111"]);

    let (status, json) =
        send_json(app(&dir, "development"), multipart_request("other", &bytes)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "No file was uploaded");
}

#[tokio::test]
async fn test_import_without_multipart_body() {
    let dir = TempDir::new().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/import")
        .body(Body::empty())
        .unwrap();

    let (status, json) = send_json(app(&dir, "development"), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file was uploaded");
}

#[tokio::test]
async fn test_import_missing_headers_lists_them() {
    let dir = TempDir::new().unwrap();
    let headers: Vec<&str> = template_headers()
        .into_iter()
        .filter(|h| *h != "NIF" && *h != "REJET")
        .collect();
    let bytes = workbook(&headers, &["111"]);

    let (status, json) =
        send_json(app(&dir, "production"), multipart_request("file", &bytes)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(
        json["details"]["missing_headers"],
        serde_json::json!(["NIF", "REJET"])
    );
    assert_eq!(
        json["details"]["found_headers"].as_array().unwrap().len(),
        9
    );
    assert!(json["details"]["suggestion"].is_string());
}

#[tokio::test]
async fn test_import_with_no_valid_rows() {
    let dir = TempDir::new().unwrap();
    let bytes = workbook(&template_headers(), &["", "  "]);

    let (status, json) =
        send_json(app(&dir, "development"), multipart_request("file", &bytes)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(stored_count(dir.path()), 0);
}

#[tokio::test]
async fn test_import_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let good = workbook(&template_headers(), &["111"]);

    send_json(app(&dir, "development"), multipart_request("file", &good)).await;
    send_json(
        app(&dir, "development"),
        multipart_request("file", b"not a workbook"),
    )
    .await;

    let leftovers = std::fs::read_dir(dir.path().join("uploads"))
        .unwrap()
        .count();
    assert_eq!(leftovers, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// TEMPLATE ENDPOINT
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_template_download() {
    let dir = TempDir::new().unwrap();
    let response = app(&dir, "development")
        .oneshot(get("/api/v1/template"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.contains("spreadsheetml"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let sheet = WorkbookReader::from_bytes(bytes.to_vec()).unwrap();
    assert_eq!(sheet.headers.len(), 11);
}
