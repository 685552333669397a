pub mod audit;
pub mod types;

pub use audit::{hash_document, AuditError, AuditRecord, AuditSink, JsonlAuditLog, MemoryAuditLog};
pub use types::{
    Clause, ClassificationResult, ContractAnalysis, DefinedTerm, Document, DocumentFormat, Entity,
    EntityCategory, Explanation, HeadingKind, RiskFinding, RiskLevel, RiskSummary, Severity, Span,
    TypeScore, UNCLASSIFIED,
};
