//! Report compilation
//!
//! The report structure is serialized to JSON, exposed to the embedded
//! template as `sys.inputs.report`, compiled in memory and exported to PDF.

use chrono::{DateTime, Utc};
use shared_types::ContractAnalysis;
use typst::diag::{Severity, SourceDiagnostic};

use super::errors::ReportError;
use crate::builder::{build_report, ReportDocument};
use crate::templates::REPORT_TEMPLATE;
use crate::world::ReportWorld;

/// Render the PDF report for an analysis
pub fn render_pdf(
    analysis: &ContractAnalysis,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ReportError> {
    render_report(&build_report(analysis, generated_at), generated_at)
}

/// Render an already-built report structure
pub fn render_report(
    report: &ReportDocument,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ReportError> {
    let value =
        serde_json::to_value(report).map_err(|e| ReportError::InvalidInput(e.to_string()))?;
    let mut inputs = serde_json::Map::new();
    inputs.insert("report".to_string(), value);

    compile_source(REPORT_TEMPLATE, inputs, generated_at)
}

/// Render with a deadline on the blocking pool
///
/// The deadline bounds how long the caller waits, not the render itself:
/// a blocking task cannot be aborted, so on timeout the compilation runs to
/// completion in the background and its output is dropped.
#[cfg(feature = "server")]
pub async fn render_pdf_with_timeout(
    analysis: ContractAnalysis,
    generated_at: DateTime<Utc>,
    timeout_ms: u64,
) -> Result<Vec<u8>, ReportError> {
    let result = tokio::time::timeout(
        std::time::Duration::from_millis(timeout_ms),
        tokio::task::spawn_blocking(move || render_pdf(&analysis, generated_at)),
    )
    .await;

    match result {
        Ok(Ok(rendered)) => rendered,
        Ok(Err(join_error)) => Err(ReportError::Task(join_error.to_string())),
        Err(_timeout) => Err(ReportError::Timeout(timeout_ms)),
    }
}

pub(crate) fn compile_source(
    source: &str,
    inputs: serde_json::Map<String, serde_json::Value>,
    time: DateTime<Utc>,
) -> Result<Vec<u8>, ReportError> {
    let world = ReportWorld::new(source, inputs, time)?;

    // Warned<Result<Document, EcoVec<SourceDiagnostic>>>
    let warned = typst::compile(&world);
    for warning in warned.warnings.iter() {
        tracing::debug!(message = %warning.message, "typst warning");
    }

    let document = warned
        .output
        .map_err(|diagnostics| ReportError::Compile(error_messages(&diagnostics)))?;

    let pdf = typst_pdf::pdf(&document, &typst_pdf::PdfOptions::default())
        .map_err(|diagnostics| ReportError::Export(error_messages(&diagnostics).join("; ")))?;

    tracing::info!(
        pages = document.pages.len(),
        bytes = pdf.len(),
        "report rendered"
    );
    Ok(pdf)
}

/// Error messages with their hints
fn error_messages(diagnostics: &[SourceDiagnostic]) -> Vec<String> {
    let messages: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| {
            if d.hints.is_empty() {
                d.message.to_string()
            } else {
                let hints = d
                    .hints
                    .iter()
                    .map(|h| h.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                format!("{} (hint: {})", d.message, hints)
            }
        })
        .collect();

    if messages.is_empty() {
        vec!["unknown error".to_string()]
    } else {
        messages
    }
}
