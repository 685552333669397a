//! Risk scoring
//!
//! Every top-level clause is scanned against every risk category. The first
//! match of a category inside a clause yields one finding, attributed to the
//! most specific clause (sub-clause if any) containing the match.

use regex::Regex;
use shared_types::{Clause, RiskFinding, RiskLevel, RiskSummary, Severity};

use crate::patterns::evidence_at;
use crate::rules::{RiskRule, RuleConfig, RuleError, ScoringConfig};

struct CompiledRisk {
    id: String,
    name: String,
    severity: Severity,
    description: String,
    pattern: Regex,
}

/// Rule-table driven risk scorer
pub struct RiskScorer {
    categories: Vec<CompiledRisk>,
    scoring: ScoringConfig,
}

impl RiskScorer {
    pub fn new(rules: &RuleConfig) -> Result<Self, RuleError> {
        let categories = rules
            .risks
            .iter()
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            categories,
            scoring: rules.scoring.clone(),
        })
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Scan clauses for risk findings, ordered by offset
    pub fn score(&self, text: &str, clauses: &[Clause]) -> Vec<RiskFinding> {
        let mut findings = Vec::new();

        for clause in clauses.iter().filter(|c| c.is_top_level()) {
            let span = clause.span();
            let Some(scope) = text.get(span.start..span.end) else {
                continue;
            };

            for category in &self.categories {
                let Some(m) = category.pattern.find(scope) else {
                    continue;
                };
                let offset = span.start + m.start();
                let owner = most_specific(clauses, clause, offset);

                findings.push(RiskFinding {
                    category: category.id.clone(),
                    category_name: category.name.clone(),
                    severity: category.severity,
                    clause_ordinal: owner.ordinal,
                    matched_text: m.as_str().to_string(),
                    offset,
                    evidence: evidence_for(text, owner, offset),
                    description: category.description.clone(),
                    explanation: None,
                });
            }
        }

        findings.sort_by_key(|f| f.offset);
        tracing::debug!(findings = findings.len(), "risk scan complete");
        findings
    }

    /// Aggregate findings into a 0-100 score and level
    pub fn summarize(&self, findings: &[RiskFinding]) -> RiskSummary {
        let raw: f64 = findings
            .iter()
            .map(|f| self.scoring.weight(f.severity))
            .sum();
        let score = if findings.is_empty() {
            0
        } else {
            (100.0 * raw / self.scoring.saturation).round().clamp(0.0, 100.0) as u8
        };

        RiskSummary {
            score,
            level: self.level(score),
            finding_count: findings.len(),
        }
    }

    pub fn level(&self, score: u8) -> RiskLevel {
        if score >= self.scoring.high_threshold {
            RiskLevel::High
        } else if score >= self.scoring.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

fn compile(rule: &RiskRule) -> Result<CompiledRisk, RuleError> {
    let alternation = rule
        .patterns
        .iter()
        .map(|p| format!("(?:{})", p))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = Regex::new(&format!("(?i){}", alternation)).map_err(|source| {
        RuleError::Pattern {
            category: rule.id.clone(),
            source,
        }
    })?;

    Ok(CompiledRisk {
        id: rule.id.clone(),
        name: rule.name.clone(),
        severity: rule.severity,
        description: rule.description.clone(),
        pattern,
    })
}

/// Sentence around the match. A match inside the heading quotes the first
/// sentence of the body instead, when the body has one.
fn evidence_for(text: &str, clause: &Clause, offset: usize) -> String {
    if clause.heading_span.contains(offset) {
        let body = clause.body_span;
        if let Some(body_text) = text.get(body.start..body.end) {
            let lead = body_text.len() - body_text.trim_start().len();
            if lead < body_text.len() {
                return evidence_at(text, body.start + lead);
            }
        }
    }
    evidence_at(text, offset)
}

/// The sub-clause of `top` containing `offset`, or `top` itself
fn most_specific<'a>(clauses: &'a [Clause], top: &'a Clause, offset: usize) -> &'a Clause {
    clauses
        .iter()
        .filter(|c| c.parent == Some(top.ordinal) && c.span().contains(offset))
        .min_by_key(|c| c.span().len())
        .unwrap_or(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::ClauseSegmenter;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn scorer() -> RiskScorer {
        RiskScorer::new(&RuleConfig::embedded().unwrap()).unwrap()
    }

    fn finding(severity: Severity) -> RiskFinding {
        RiskFinding {
            category: "x".into(),
            category_name: "X".into(),
            severity,
            clause_ordinal: 1,
            matched_text: "x".into(),
            offset: 0,
            evidence: "x".into(),
            description: "x".into(),
            explanation: None,
        }
    }

    #[test]
    fn test_two_clause_contract() {
        let text = "1. Payment. Client shall pay $100 within 30 days. 2. Termination. Either party may terminate with 30 days notice.";
        let clauses = ClauseSegmenter::clauses(text);
        let scorer = scorer();
        let findings = scorer.score(text, &clauses);

        let termination: Vec<&RiskFinding> =
            findings.iter().filter(|f| f.category == "termination").collect();
        assert_eq!(termination.len(), 1);
        assert_eq!(termination[0].clause_ordinal, 2);
        assert_eq!(termination[0].matched_text, "Termination");
        assert!(termination[0].severity >= Severity::Medium);
        assert_eq!(
            termination[0].evidence,
            "Either party may terminate with 30 days notice."
        );

        let summary = scorer.summarize(&findings);
        assert!(summary.score > 0);
        assert_eq!(summary.finding_count, findings.len());
    }

    #[test]
    fn test_heading_match_without_body_quotes_heading() {
        let text = "1. Payment\nClient shall pay $100.\n\n2. Termination";
        let clauses = ClauseSegmenter::clauses(text);
        let findings = scorer().score(text, &clauses);
        let termination = findings.iter().find(|f| f.category == "termination").unwrap();
        assert_eq!(termination.evidence, "Termination");
    }

    #[test]
    fn test_one_finding_per_clause_and_category() {
        let text = "1. Exit\nEither party may terminate. Termination takes effect after notice. The other party may also terminate.";
        let clauses = ClauseSegmenter::clauses(text);
        let findings = scorer().score(text, &clauses);
        let count = findings.iter().filter(|f| f.category == "termination").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_attributed_to_sub_clause() {
        let text = "1. GENERAL\n1.1 Scope. The services are described below.\n1.2 Exit. Either party may terminate on notice.";
        let clauses = ClauseSegmenter::clauses(text);
        let findings = scorer().score(text, &clauses);
        let termination = findings.iter().find(|f| f.category == "termination").unwrap();
        let owner = clauses
            .iter()
            .find(|c| c.ordinal == termination.clause_ordinal)
            .unwrap();
        assert_eq!(owner.number.as_deref(), Some("1.2"));
        assert_eq!(termination.evidence, "Either party may terminate on notice.");
    }

    #[test]
    fn test_every_finding_references_existing_clause() {
        let text = "AGREEMENT\nThe Vendor shall indemnify the Client.\nCONFIDENTIALITY\nAll information is confidential. Penalties apply.";
        let clauses = ClauseSegmenter::clauses(text);
        let findings = scorer().score(text, &clauses);
        assert!(!findings.is_empty());
        for f in &findings {
            assert!(clauses.iter().any(|c| c.ordinal == f.clause_ordinal));
        }
    }

    #[test]
    fn test_no_findings_scores_zero() {
        let text = "The parties met for lunch and discussed the weather.";
        let clauses = ClauseSegmenter::clauses(text);
        let scorer = scorer();
        let findings = scorer.score(text, &clauses);
        assert!(findings.is_empty());
        assert_eq!(scorer.summarize(&findings), RiskSummary::default());
    }

    #[test]
    fn test_score_formula_and_levels() {
        let scorer = scorer();
        // 5 / 25 = 20
        assert_eq!(scorer.summarize(&[finding(Severity::High)]).score, 20);
        // (5 + 5 + 3 + 1) / 25 = 56
        let mixed = [
            finding(Severity::High),
            finding(Severity::High),
            finding(Severity::Medium),
            finding(Severity::Low),
        ];
        let summary = scorer.summarize(&mixed);
        assert_eq!(summary.score, 56);
        assert_eq!(summary.level, RiskLevel::Medium);

        let capped = vec![finding(Severity::High); 10];
        let summary = scorer.summarize(&capped);
        assert_eq!(summary.score, 100);
        assert_eq!(summary.level, RiskLevel::High);
    }

    #[test]
    fn test_custom_scoring() {
        let mut rules = RuleConfig::embedded().unwrap();
        rules.scoring.saturation = 5.0;
        rules.scoring.high_threshold = 90;
        let scorer = RiskScorer::new(&rules).unwrap();
        let summary = scorer.summarize(&[finding(Severity::Medium)]);
        assert_eq!(summary.score, 60);
        assert_eq!(summary.level, RiskLevel::Medium);
    }

    fn severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Low),
            Just(Severity::Medium),
            Just(Severity::High)
        ]
    }

    proptest! {
        #[test]
        fn adding_high_finding_never_lowers_score(
            severities in proptest::collection::vec(severity(), 0..20)
        ) {
            let scorer = scorer();
            let mut findings: Vec<RiskFinding> = severities.into_iter().map(finding).collect();
            let before = scorer.summarize(&findings).score;
            findings.push(finding(Severity::High));
            let after = scorer.summarize(&findings).score;
            prop_assert!(after >= before);
            prop_assert!(after <= 100);
        }

        #[test]
        fn scoring_is_deterministic(text in "[A-Za-z .,\n]{0,300}") {
            let scorer = scorer();
            let clauses = ClauseSegmenter::clauses(&text);
            let first = scorer.score(&text, &clauses);
            let second = scorer.score(&text, &clauses);
            prop_assert_eq!(scorer.summarize(&first), scorer.summarize(&second));
            prop_assert_eq!(first, second);
        }
    }
}
