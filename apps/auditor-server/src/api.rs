//! API handlers for the auditor server
//!
//! Provides REST endpoints for:
//! - Document analysis (multipart upload)
//! - PDF report download
//! - Audit log listing

use std::path::Path;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared_types::{AuditRecord, ContractAnalysis};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Multipart field carrying the upload
pub const UPLOAD_FIELD: &str = "file";

pub const DEFAULT_AUDIT_LIMIT: usize = 20;
pub const MAX_AUDIT_LIMIT: usize = 500;

/// Handler: GET /
pub async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "auditor-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /api/analyze
///
/// Extraction and analysis run on the blocking pool. The audit record is
/// written before the response, so a failed append fails the request.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ContractAnalysis>, ServerError> {
    let mut multipart = multipart.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let (filename, bytes) = read_upload(&mut multipart).await?;
    info!(filename = %filename, bytes = bytes.len(), "analyze request");

    let engine = state.engine.clone();
    let audit = state.audit.clone();
    let analysis = tokio::task::spawn_blocking(move || -> Result<ContractAnalysis, ServerError> {
        let document = doc_extract::extract(&filename, bytes)?;
        let analysis = engine.analyze(&document);
        audit.append(&AuditRecord::from_analysis(&analysis, Utc::now()))?;
        Ok(analysis)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    info!(
        filename = %analysis.filename,
        clauses = analysis.clauses.len(),
        findings = analysis.findings.len(),
        score = analysis.risk.score,
        contract_type = %analysis.classification.contract_type,
        "analysis complete"
    );
    Ok(Json(analysis))
}

/// Pull the first `file` field with a filename out of the form
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(name = ?field.name(), "skipping multipart field");
            continue;
        }

        let filename = match field.file_name() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => {
                return Err(ServerError::InvalidRequest(
                    "Uploaded file has no filename".to_string(),
                ))
            }
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
        return Ok((filename, bytes.to_vec()));
    }

    Err(ServerError::InvalidRequest(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

/// Handler: POST /api/report
pub async fn handle_report(
    State(state): State<AppState>,
    payload: Result<Json<ContractAnalysis>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(analysis) = payload.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    info!(filename = %analysis.filename, "report request");

    let download = report_filename(&analysis.filename);
    let pdf =
        report_engine::render_pdf_with_timeout(analysis, Utc::now(), state.timeout_ms).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// `<stem>_report.pdf`, restricted to characters safe in a header value
pub fn report_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let safe: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if safe.trim_matches(|c| c == '_' || c == '.').is_empty() {
        "contract_report.pdf".to_string()
    } else {
        format!("{}_report.pdf", safe)
    }
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct AuditListResponse {
    pub success: bool,
    pub count: usize,
    pub records: Vec<AuditRecord>,
}

/// Handler: GET /api/audit
pub async fn handle_audit(
    State(state): State<AppState>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<AuditListResponse>, ServerError> {
    let Query(query) = query.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .min(MAX_AUDIT_LIMIT);

    let audit = state.audit.clone();
    let records = tokio::task::spawn_blocking(move || audit.recent(limit))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(AuditListResponse {
        success: true,
        count: records.len(),
        records,
    }))
}
