use serde::{Deserialize, Serialize};

/// Label returned by the classifier when no contract type matches
pub const UNCLASSIFIED: &str = "Unclassified";

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Detect the format from a filename's extension
    pub fn from_filename(name: &str) -> Option<Self> {
        std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document after text extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub format: DocumentFormat,
    /// Raw upload bytes (not serialized)
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Normalized text, line structure preserved
    pub text: String,
    /// Page count for PDF input
    pub page_count: Option<usize>,
    /// SHA-256 of the raw bytes, hex encoded
    pub sha256: String,
}

/// Byte range into the normalized document text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Which heading family introduced a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingKind {
    /// Whole document, no headings found
    Unlabeled,
    /// Text before the first heading
    Preamble,
    /// "1. Payment"
    Numbered,
    /// "Section 4" / "Article IV"
    Section,
    /// "TERMINATION" on its own line
    AllCaps,
    /// "2.1" sub-clause
    Decimal,
    /// "(a)" / "(iv)" sub-clause
    Lettered,
}

/// A labeled clause or sub-clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Position in document order, unique across clauses and sub-clauses
    pub ordinal: usize,
    pub kind: HeadingKind,
    /// Heading number as written ("1", "Section 4", "2.1", "(a)")
    pub number: Option<String>,
    pub title: Option<String>,
    /// Trimmed body text
    pub body: String,
    /// Heading marker span (empty for unlabeled clauses)
    pub heading_span: Span,
    /// Untrimmed body span
    pub body_span: Span,
    /// Ordinal of the enclosing top-level clause
    pub parent: Option<usize>,
}

impl Clause {
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// Full span covered by heading and body
    pub fn span(&self) -> Span {
        Span::new(self.heading_span.start.min(self.body_span.start), self.body_span.end)
    }

    /// Human-readable heading, e.g. "2. Termination" or "Clause 2"
    pub fn label(&self) -> String {
        match (&self.number, &self.title) {
            (Some(number), Some(title)) if self.kind == HeadingKind::Numbered => {
                format!("{}. {}", number, title)
            }
            (Some(number), Some(title)) => format!("{} {}", number, title),
            (Some(number), None) => number.clone(),
            (None, Some(title)) => title.clone(),
            (None, None) => match self.kind {
                HeadingKind::Preamble => "Preamble".to_string(),
                _ => format!("Clause {}", self.ordinal),
            },
        }
    }
}

/// A defined term such as `"Company" means ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedTerm {
    pub term: String,
    pub definition: String,
    /// Byte offset of the first occurrence of the quoted term
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Party,
    Date,
    Amount,
    Jurisdiction,
    Contact,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 5] = [
        EntityCategory::Party,
        EntityCategory::Date,
        EntityCategory::Amount,
        EntityCategory::Jurisdiction,
        EntityCategory::Contact,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Party => "Parties",
            Self::Date => "Dates",
            Self::Amount => "Amounts",
            Self::Jurisdiction => "Jurisdictions",
            Self::Contact => "Contacts",
        }
    }
}

/// A tagged fact span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub category: EntityCategory,
    pub text: String,
    pub offset: usize,
    /// Refinement within the category ("currency", "email", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// A clause matching a risk category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    /// Category id from the rule table ("termination")
    pub category: String,
    /// Display name ("Termination")
    pub category_name: String,
    pub severity: Severity,
    /// Ordinal of the most specific clause containing the match
    pub clause_ordinal: usize,
    pub matched_text: String,
    pub offset: usize,
    /// Sentence around the match, at most 200 characters
    pub evidence: String,
    pub description: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }
}

/// Contract-level risk aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// 0-100
    pub score: u8,
    pub level: RiskLevel,
    pub finding_count: usize,
}

impl Default for RiskSummary {
    fn default() -> Self {
        Self {
            score: 0,
            level: RiskLevel::Low,
            finding_count: 0,
        }
    }
}

/// How strongly one contract type matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeScore {
    pub contract_type: String,
    pub matched_weight: f64,
    pub total_weight: f64,
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub contract_type: String,
    /// In [0, 1]
    pub confidence: f64,
    pub description: String,
    /// Every type with at least one matched keyword, best first
    #[serde(default)]
    pub scores: Vec<TypeScore>,
}

impl ClassificationResult {
    pub fn unclassified() -> Self {
        Self {
            contract_type: UNCLASSIFIED.to_string(),
            confidence: 0.0,
            description: "No contract type profile matched this document.".to_string(),
            scores: Vec::new(),
        }
    }

    pub fn is_unclassified(&self) -> bool {
        self.contract_type == UNCLASSIFIED
    }
}

/// Plain-language guidance for one risk category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub category: String,
    pub title: String,
    pub explanation: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Everything the pipeline produced for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAnalysis {
    pub filename: String,
    pub format: DocumentFormat,
    pub document_sha256: String,
    #[serde(default)]
    pub page_count: Option<usize>,
    /// RFC 3339 timestamp of the analysis
    pub analyzed_at: String,
    /// Normalized text every offset refers to
    #[serde(default)]
    pub text: String,
    pub clauses: Vec<Clause>,
    pub definitions: Vec<DefinedTerm>,
    pub entities: Vec<Entity>,
    pub findings: Vec<RiskFinding>,
    pub risk: RiskSummary,
    pub classification: ClassificationResult,
    /// One entry per distinct finding category, in first-seen order
    pub explanations: Vec<Explanation>,
}

impl ContractAnalysis {
    pub fn top_level_clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(|c| c.is_top_level())
    }

    pub fn clause(&self, ordinal: usize) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.ordinal == ordinal)
    }

    pub fn entities_in(&self, category: EntityCategory) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clause(kind: HeadingKind, number: Option<&str>, title: Option<&str>) -> Clause {
        Clause {
            ordinal: 2,
            kind,
            number: number.map(String::from),
            title: title.map(String::from),
            body: String::new(),
            heading_span: Span::default(),
            body_span: Span::default(),
            parent: None,
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("Txt"), Some(DocumentFormat::Txt));
        assert_eq!(DocumentFormat::from_extension("rtf"), None);
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("Lease.Final.DOCX"),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::from_filename("README"), None);
        assert_eq!(DocumentFormat::from_filename(".txt"), None);
    }

    #[test]
    fn test_clause_labels() {
        assert_eq!(
            clause(HeadingKind::Numbered, Some("2"), Some("Termination")).label(),
            "2. Termination"
        );
        assert_eq!(
            clause(HeadingKind::Section, Some("Section 4"), Some("Fees")).label(),
            "Section 4 Fees"
        );
        assert_eq!(clause(HeadingKind::Lettered, Some("(a)"), None).label(), "(a)");
        assert_eq!(clause(HeadingKind::Preamble, None, None).label(), "Preamble");
        assert_eq!(clause(HeadingKind::Unlabeled, None, None).label(), "Clause 2");
    }

    #[test]
    fn test_risk_level_serializes_as_label() {
        let json = serde_json::to_string(&RiskLevel::Medium).unwrap();
        assert_eq!(json, "\"Medium Risk\"");
    }

    #[test]
    fn test_span_contains() {
        let span = Span::new(3, 7);
        assert!(span.contains(3));
        assert!(!span.contains(7));
        assert_eq!(span.len(), 4);
    }
}
