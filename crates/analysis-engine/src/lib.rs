//! Contract analysis pipeline
//!
//! Segments normalized contract text into clauses, tags entities, flags risk
//! clauses, classifies the contract type and attaches plain-language
//! explanations. All rule tables are loaded once into [`AnalysisEngine`] and
//! shared read-only.

pub mod classifier;
pub mod definitions;
pub mod entities;
pub mod explainer;
pub mod patterns;
pub mod risk;
pub mod rules;
pub mod segmenter;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use shared_types::{ContractAnalysis, Document};

pub use classifier::Classifier;
pub use entities::EntityTagger;
pub use explainer::Explainer;
pub use risk::RiskScorer;
pub use rules::{RuleConfig, RuleError};
pub use segmenter::{ClauseSegmenter, Segmentation};

/// Analysis pipeline over a fixed set of rule tables
pub struct AnalysisEngine {
    tagger: EntityTagger,
    scorer: RiskScorer,
    classifier: Classifier,
    explainer: Explainer,
}

impl AnalysisEngine {
    pub fn new(rules: &RuleConfig) -> Result<Self, RuleError> {
        Ok(Self {
            tagger: EntityTagger::new(&rules.entities),
            scorer: RiskScorer::new(rules)?,
            classifier: Classifier::new(&rules.contract_types)?,
            explainer: Explainer::new(&rules.risks),
        })
    }

    /// Engine over the embedded default rules
    pub fn with_default_rules() -> Result<Self, RuleError> {
        Self::new(&RuleConfig::embedded()?)
    }

    pub fn from_rules_file<P: AsRef<Path>>(path: P) -> Result<Self, RuleError> {
        Self::new(&RuleConfig::from_path(path)?)
    }

    pub fn explainer(&self) -> &Explainer {
        &self.explainer
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Analyze a document, stamped with the current time
    pub fn analyze(&self, document: &Document) -> ContractAnalysis {
        self.analyze_at(document, Utc::now())
    }

    /// Analyze a document with an explicit timestamp
    ///
    /// Everything except `analyzed_at` is a pure function of the document
    /// text and the rule tables.
    pub fn analyze_at(&self, document: &Document, at: DateTime<Utc>) -> ContractAnalysis {
        let text = document.text.as_str();

        let Segmentation {
            clauses,
            definitions,
        } = ClauseSegmenter::segment(text);
        let entities = self.tagger.tag(text);
        let mut findings = self.scorer.score(text, &clauses);
        let classification = self.classifier.classify(text);

        self.explainer.annotate(&mut findings);
        let explanations = self.explainer.explanations_for(&findings);
        let risk = self.scorer.summarize(&findings);

        tracing::info!(
            filename = %document.filename,
            format = %document.format,
            clauses = clauses.len(),
            entities = entities.len(),
            findings = findings.len(),
            score = risk.score,
            contract_type = %classification.contract_type,
            "contract analyzed"
        );

        ContractAnalysis {
            filename: document.filename.clone(),
            format: document.format,
            document_sha256: document.sha256.clone(),
            page_count: document.page_count,
            analyzed_at: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            text: text.to_string(),
            clauses,
            definitions,
            entities,
            findings,
            risk,
            classification,
            explanations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use shared_types::{DocumentFormat, EntityCategory, RiskLevel};

    fn document(text: &str) -> Document {
        Document {
            filename: "contract.txt".to_string(),
            format: DocumentFormat::Txt,
            bytes: text.as_bytes().to_vec(),
            text: text.to_string(),
            page_count: None,
            sha256: shared_types::hash_document(text.as_bytes()),
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    const SERVICE_AGREEMENT: &str = "SERVICE AGREEMENT\nThis Service Agreement is made between Acme Corp. (the \"Client\") and Globex LLC (the \"Contractor\") on March 1, 2024.\n\n1. Services\n\"Services\" means the consulting work described in Exhibit A.\n\n2. Payment\nClient shall pay $5,000 per month. Late payments incur a penalty of 2% per month.\n\n3. Termination\nEither party may terminate this Agreement on 30 days notice. Contractor shall indemnify Client against all claims.\n\n4. Governing Law\nThis Agreement is governed by the laws of the State of California.";

    #[test]
    fn test_two_clause_example() {
        let engine = AnalysisEngine::with_default_rules().unwrap();
        let text = "1. Payment. Client shall pay $100 within 30 days. 2. Termination. Either party may terminate with 30 days notice.";
        let analysis = engine.analyze_at(&document(text), fixed_time());

        assert_eq!(analysis.top_level_clauses().count(), 2);
        assert!(analysis
            .findings
            .iter()
            .any(|f| f.category == "termination"));
        assert!(analysis.risk.score > 0);
        assert_eq!(analysis.analyzed_at, "2024-03-01T12:00:00Z");
    }

    #[test]
    fn test_full_pipeline() {
        let engine = AnalysisEngine::with_default_rules().unwrap();
        let analysis = engine.analyze_at(&document(SERVICE_AGREEMENT), fixed_time());

        assert_eq!(analysis.classification.contract_type, "Service Agreement");
        assert!(analysis.definitions.iter().any(|d| d.term == "Services"));
        assert!(analysis
            .entities_in(EntityCategory::Jurisdiction)
            .any(|e| e.text == "California"));
        assert!(analysis
            .entities_in(EntityCategory::Party)
            .any(|e| e.text == "Globex LLC"));

        let categories: Vec<&str> = analysis.findings.iter().map(|f| f.category.as_str()).collect();
        for expected in ["penalty", "termination", "indemnity", "governing_law"] {
            assert!(categories.contains(&expected), "missing {}", expected);
        }
        assert!(analysis.findings.iter().all(|f| f.explanation.is_some()));
        assert!(analysis
            .findings
            .iter()
            .all(|f| analysis.clause(f.clause_ordinal).is_some()));

        let explained: Vec<&str> = analysis.explanations.iter().map(|e| e.category.as_str()).collect();
        let mut distinct = explained.clone();
        distinct.dedup();
        assert_eq!(explained.len(), distinct.len());
        assert!(analysis.risk.level >= RiskLevel::Medium);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let engine = AnalysisEngine::with_default_rules().unwrap();
        let doc = document(SERVICE_AGREEMENT);
        let first = engine.analyze_at(&doc, fixed_time());
        let second = engine.analyze_at(&doc, fixed_time());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_analysis_carries_normalized_text() {
        let engine = AnalysisEngine::with_default_rules().unwrap();
        let analysis = engine.analyze_at(&document(SERVICE_AGREEMENT), fixed_time());

        assert_eq!(analysis.text, SERVICE_AGREEMENT);
        for finding in &analysis.findings {
            let end = finding.offset + finding.matched_text.len();
            assert_eq!(&analysis.text[finding.offset..end], finding.matched_text);
        }
    }

    #[test]
    fn test_empty_text_is_unclassified() {
        let engine = AnalysisEngine::with_default_rules().unwrap();
        let analysis = engine.analyze_at(&document(""), fixed_time());

        assert!(analysis.classification.is_unclassified());
        assert_eq!(analysis.classification.confidence, 0.0);
        assert!(analysis.findings.is_empty());
        assert_eq!(analysis.risk.score, 0);
        assert_eq!(analysis.clauses.len(), 1);
    }

    #[test]
    fn test_custom_rules_replace_defaults() {
        let rules = RuleConfig::from_toml_str(
            r#"
            [[risk]]
            id = "weather"
            name = "Weather"
            severity = "high"
            description = "Mentions of weather"
            patterns = ['\brain\b']
            explanation = "Rain is mentioned."
            "#,
        )
        .unwrap();
        let engine = AnalysisEngine::new(&rules).unwrap();
        let analysis = engine.analyze_at(&document("We expect rain. Either party may terminate."), fixed_time());

        assert_eq!(analysis.findings.len(), 1);
        assert_eq!(analysis.findings[0].category, "weather");
        assert!(analysis.classification.is_unclassified());
        assert!(analysis.entities.is_empty());
    }
}
