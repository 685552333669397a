//! Typst compilation of reports to PDF

pub mod errors;
pub mod render;

pub use errors::ReportError;
pub use render::{render_pdf, render_report};

#[cfg(feature = "server")]
pub use render::render_pdf_with_timeout;
