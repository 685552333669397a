//! Report rendering errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid report input: {0}")]
    InvalidInput(String),

    /// Typst diagnostics, one message per error
    #[error("Report compilation failed: {}", .0.join("; "))]
    Compile(Vec<String>),

    #[error("PDF export failed: {0}")]
    Export(String),

    #[error("Report rendering timed out after {0}ms")]
    Timeout(u64),

    #[error("Report task failed: {0}")]
    Task(String),
}

impl ReportError {
    /// Stable code for API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "TIMEOUT",
            _ => "REPORT_ERROR",
        }
    }
}
