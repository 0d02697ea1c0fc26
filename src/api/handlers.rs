//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::IntakeError;
use crate::excel::TemplateWriter;
use crate::import::ImportOrchestrator;
use crate::store::SqliteStore;
use crate::types::ImportSummary;

use super::server::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Actionable detail attached to a failed import
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Storage or filesystem detail, never sent in production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(path: &str, method: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Intake API Server".to_string(),
        version: state.version.clone(),
        description: "Taxpayer spreadsheet import".to_string(),
        endpoints: vec![
            EndpointInfo::new("/health", "GET", "Health check endpoint"),
            EndpointInfo::new("/version", "GET", "Get server version"),
            EndpointInfo::new(
                "/api/v1/import",
                "POST",
                "Import taxpayers from an Excel upload (multipart field 'file')",
            ),
            EndpointInfo::new("/api/v1/template", "GET", "Download a blank import template"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec!["import".to_string(), "template".to_string()],
    }))
}

/// POST /api/v1/import - Import an Excel upload
pub async fn import_excel(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let upload = match multipart {
        Ok(multipart) => match read_upload(multipart).await {
            Ok(upload) => upload,
            Err(message) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<ImportSummary>::err(message)),
                )
                    .into_response()
            }
        },
        Err(rejection) => {
            warn!("Import request without multipart body: {}", rejection);
            None
        }
    };

    let worker_state = Arc::clone(&state);
    let joined = tokio::task::spawn_blocking(move || {
        let mut store = SqliteStore::open(&worker_state.database_path)?;
        ImportOrchestrator::new(&mut store, &worker_state.upload_dir).import_upload(upload)
    })
    .await;

    match joined {
        Ok(Ok(summary)) => (StatusCode::OK, Json(ApiResponse::ok(summary))).into_response(),
        Ok(Err(e)) => import_error_response(&state, &e).into_response(),
        Err(e) => {
            error!("Import task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<ImportSummary>::err(
                    "Error while processing the file.",
                )),
            )
                .into_response()
        }
    }
}

/// Pull the `file` field out of a multipart body
async fn read_upload(mut multipart: Multipart) -> Result<Option<Vec<u8>>, String> {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                match field.bytes().await {
                    Ok(bytes) => upload = Some(bytes.to_vec()),
                    Err(e) => {
                        warn!("Failed to read upload bytes: {}", e);
                        return Err("Failed to read file data.".to_string());
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return Err("Malformed multipart body.".to_string());
            }
        }
    }
    Ok(upload)
}

/// Map a pipeline error to a status code and response body
pub fn import_error_response(
    state: &AppState,
    err: &IntakeError,
) -> (StatusCode, Json<ApiResponse<ImportSummary>>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let response = match err {
        IntakeError::MissingHeaders { missing, found } => {
            ApiResponse::err("Missing headers in the Excel file").with_details(ErrorDetails {
                missing_headers: Some(missing.clone()),
                found_headers: Some(found.clone()),
                suggestion: Some("Check the headers for extra spaces".to_string()),
                internal: None,
            })
        }
        e if e.is_internal() => {
            error!("Import failed: {}", e);
            let response = ApiResponse::err("Error while processing the file.");
            if state.is_production() {
                response
            } else {
                response.with_details(ErrorDetails {
                    internal: Some(e.to_string()),
                    ..ErrorDetails::default()
                })
            }
        }
        e => ApiResponse::err(e.to_string()),
    };

    (status, Json(response))
}

/// GET /api/v1/template - Blank import workbook
pub async fn template() -> Response {
    match TemplateWriter::new().to_bytes() {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"intake-template.xlsx\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Template generation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<ImportSummary>::err(e.to_string())),
            )
                .into_response()
        }
    }
}
