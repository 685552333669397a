//! Report structure
//!
//! Turns a [`ContractAnalysis`] into an ordered list of sections. The
//! structure is format-neutral; the Typst template only lays it out.

use analysis_engine::Explainer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ContractAnalysis, EntityCategory, RiskLevel};

pub const REPORT_TITLE: &str = "Contract Analysis Report";

pub const DISCLAIMER: &str =
    "This report is for informational purposes. Consult legal counsel for definitive advice.";

pub const OVERVIEW: &str = "Overview";
pub const CONTRACT_TYPE: &str = "Contract Type";
pub const ENTITIES: &str = "Entities";
pub const RISK_ANALYSIS: &str = "Risk Analysis";
pub const CLAUSES: &str = "Clauses";
pub const DEFINITIONS: &str = "Definitions";
pub const EXPLANATIONS: &str = "Explanations";
pub const RECOMMENDATIONS: &str = "Recommendations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub lines: Vec<ReportLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportLine {
    Field { label: String, value: String },
    Bullet { text: String },
    Text { text: String },
}

impl ReportLine {
    fn field(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            label: label.into(),
            value: value.into(),
        }
    }

    fn bullet(text: impl Into<String>) -> Self {
        Self::Bullet { text: text.into() }
    }

    fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Everything the template needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: String,
    pub filename: String,
    pub sections: Vec<ReportSection>,
    pub disclaimer: String,
}

pub fn build_report(analysis: &ContractAnalysis, generated_at: DateTime<Utc>) -> ReportDocument {
    ReportDocument {
        title: REPORT_TITLE.to_string(),
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        filename: analysis.filename.clone(),
        sections: build_sections(analysis),
        disclaimer: DISCLAIMER.to_string(),
    }
}

/// Sections in fixed order. List sections are omitted when empty.
pub fn build_sections(analysis: &ContractAnalysis) -> Vec<ReportSection> {
    let mut sections = vec![overview(analysis), contract_type(analysis)];
    sections.extend(entities(analysis));
    sections.push(risk_analysis(analysis));
    sections.extend(clauses(analysis));
    sections.extend(definitions(analysis));
    sections.extend(explanations(analysis));
    sections.push(recommendations(analysis.risk.level));
    sections
}

fn section(title: &str, lines: Vec<ReportLine>) -> ReportSection {
    ReportSection {
        title: title.to_string(),
        lines,
    }
}

fn overview(analysis: &ContractAnalysis) -> ReportSection {
    let mut lines = vec![
        ReportLine::field("Contract", &analysis.filename),
        ReportLine::field("Format", analysis.format.as_str().to_uppercase()),
    ];
    if let Some(pages) = analysis.page_count {
        lines.push(ReportLine::field("Pages", pages.to_string()));
    }
    lines.extend([
        ReportLine::field("Analyzed", &analysis.analyzed_at),
        ReportLine::field("Document SHA-256", &analysis.document_sha256),
        ReportLine::field("Clauses", analysis.top_level_clauses().count().to_string()),
        ReportLine::field("Entities", analysis.entities.len().to_string()),
        ReportLine::field("Risk findings", analysis.findings.len().to_string()),
    ]);
    section(OVERVIEW, lines)
}

fn contract_type(analysis: &ContractAnalysis) -> ReportSection {
    let classification = &analysis.classification;
    let mut lines = vec![
        ReportLine::field("Type", &classification.contract_type),
        ReportLine::field(
            "Confidence",
            format!("{:.1}%", classification.confidence * 100.0),
        ),
        ReportLine::field("Description", &classification.description),
    ];
    if !classification.is_unclassified() {
        if let Some(best) = classification.scores.first() {
            lines.push(ReportLine::field(
                "Matched keywords",
                best.matched_keywords.join(", "),
            ));
        }
    }
    section(CONTRACT_TYPE, lines)
}

fn entities(analysis: &ContractAnalysis) -> Option<ReportSection> {
    let lines: Vec<ReportLine> = EntityCategory::ALL
        .iter()
        .filter_map(|category| {
            let texts: Vec<&str> = analysis
                .entities_in(*category)
                .map(|e| e.text.as_str())
                .collect();
            (!texts.is_empty()).then(|| ReportLine::field(category.label(), texts.join(", ")))
        })
        .collect();
    (!lines.is_empty()).then(|| section(ENTITIES, lines))
}

fn risk_analysis(analysis: &ContractAnalysis) -> ReportSection {
    let mut lines = vec![
        ReportLine::field("Overall Risk Score", format!("{}/100", analysis.risk.score)),
        ReportLine::field("Risk Level", analysis.risk.level.label()),
        ReportLine::field("Findings", analysis.risk.finding_count.to_string()),
    ];

    if analysis.findings.is_empty() {
        lines.push(ReportLine::text("No risk patterns were detected."));
    }
    for finding in &analysis.findings {
        let clause = analysis
            .clause(finding.clause_ordinal)
            .map(|c| c.label())
            .unwrap_or_else(|| format!("Clause {}", finding.clause_ordinal));
        lines.push(ReportLine::bullet(format!(
            "{} ({}) in {}: {}",
            finding.category_name,
            finding.severity.label(),
            clause,
            finding.evidence
        )));
    }
    section(RISK_ANALYSIS, lines)
}

fn clauses(analysis: &ContractAnalysis) -> Option<ReportSection> {
    let lines: Vec<ReportLine> = analysis
        .top_level_clauses()
        .map(|clause| {
            let summary = Explainer::summarize_clause(&clause.body)
                .replace(":\n- ", ": ")
                .replace("\n- ", "; ");
            ReportLine::field(clause.label(), summary)
        })
        .collect();
    (!lines.is_empty()).then(|| section(CLAUSES, lines))
}

fn definitions(analysis: &ContractAnalysis) -> Option<ReportSection> {
    let lines: Vec<ReportLine> = analysis
        .definitions
        .iter()
        .map(|d| ReportLine::field(&d.term, &d.definition))
        .collect();
    (!lines.is_empty()).then(|| section(DEFINITIONS, lines))
}

fn explanations(analysis: &ContractAnalysis) -> Option<ReportSection> {
    let mut lines = Vec::new();
    for explanation in &analysis.explanations {
        lines.push(ReportLine::field(&explanation.title, &explanation.explanation));
        lines.extend(
            explanation
                .key_points
                .iter()
                .map(|point| ReportLine::bullet(format!("Check: {}", point))),
        );
        lines.extend(
            explanation
                .tips
                .iter()
                .map(|tip| ReportLine::text(format!("Tip: {}", tip))),
        );
        lines.extend(
            explanation
                .alternatives
                .iter()
                .map(|alt| ReportLine::bullet(format!("Alternative: {}", alt))),
        );
    }
    (!lines.is_empty()).then(|| section(EXPLANATIONS, lines))
}

fn recommendations(level: RiskLevel) -> ReportSection {
    let advice = match level {
        RiskLevel::High => [
            "HIGH RISK: Seek legal review before signing",
            "Negotiate terms to reduce identified risks",
        ],
        RiskLevel::Medium => [
            "MEDIUM RISK: Review key clauses carefully",
            "Consider negotiating high-risk clauses",
        ],
        RiskLevel::Low => [
            "LOW RISK: Standard contract terms",
            "Proceed with normal review process",
        ],
    };
    section(
        RECOMMENDATIONS,
        advice.into_iter().map(ReportLine::bullet).collect(),
    )
}
