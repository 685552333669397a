//! PDF report rendering for contract analyses
//!
//! - [`build_sections`] arranges a [`ContractAnalysis`] into report sections
//! - [`render_pdf`] compiles them through an embedded Typst template, fully
//!   in memory with embedded fonts
//!
//! # Feature Flags
//!
//! - `server` (default): enables [`render_pdf_with_timeout`] (requires tokio)
//!
//! [`ContractAnalysis`]: shared_types::ContractAnalysis

pub mod builder;
pub mod compiler;
pub mod templates;
pub mod world;

pub use builder::{build_report, build_sections, ReportDocument, ReportLine, ReportSection};
pub use compiler::{render_pdf, render_report, ReportError};

#[cfg(feature = "server")]
pub use compiler::render_pdf_with_timeout;
