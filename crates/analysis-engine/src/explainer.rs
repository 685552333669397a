//! Plain-language explanations for risk categories

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{Explanation, RiskFinding};

use crate::rules::RiskRule;

/// Clauses shorter than this get a one-line summary
const SHORT_CLAUSE_CHARS: usize = 100;

lazy_static! {
    /// Obligation words and their gloss, in output order
    static ref GLOSSES: Vec<(Regex, &'static str)> = [
        ("must", "party is obligated to"),
        ("shall", "party must"),
        ("may", "party has the option to"),
        ("not", "party is prohibited from"),
        ("terminat(?:e|es|ed|ion)", "contract can be ended"),
        ("pay(?:s|able|ment|ments)?", "payment is required"),
        ("confidential(?:ity)?", "information must be kept private"),
    ]
    .into_iter()
    .map(|(word, gloss)| (Regex::new(&format!(r"(?i)\b{}\b", word)).unwrap(), gloss))
    .collect();
}

/// Lookup table from risk category to guidance
pub struct Explainer {
    entries: HashMap<String, Explanation>,
}

impl Explainer {
    pub fn new(rules: &[RiskRule]) -> Self {
        let entries = rules
            .iter()
            .map(|rule| {
                (
                    rule.id.clone(),
                    Explanation {
                        category: rule.id.clone(),
                        title: rule.name.clone(),
                        explanation: rule.explanation.clone(),
                        key_points: rule.key_points.clone(),
                        tips: rule.tips.clone(),
                        alternatives: rule.alternatives.clone(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Guidance for a category, or generic advice for unknown ones
    pub fn explain(&self, category: &str) -> Explanation {
        self.entries
            .get(category)
            .cloned()
            .unwrap_or_else(|| generic(category))
    }

    pub fn is_known(&self, category: &str) -> bool {
        self.entries.contains_key(category)
    }

    /// Fill each finding's explanation text
    pub fn annotate(&self, findings: &mut [RiskFinding]) {
        for finding in findings.iter_mut() {
            finding.explanation = Some(self.explain(&finding.category).explanation);
        }
    }

    /// One explanation per distinct category, first-seen order
    pub fn explanations_for(&self, findings: &[RiskFinding]) -> Vec<Explanation> {
        let mut seen = HashSet::new();
        findings
            .iter()
            .filter(|f| seen.insert(f.category.as_str()))
            .map(|f| self.explain(&f.category))
            .collect()
    }

    /// Keyword-based gloss of what a clause asks of the parties
    pub fn summarize_clause(text: &str) -> String {
        if text.trim().chars().count() < SHORT_CLAUSE_CHARS {
            return "Short clause with limited scope.".to_string();
        }

        let points: Vec<String> = GLOSSES
            .iter()
            .filter(|(word, _)| word.is_match(text))
            .map(|(_, gloss)| format!("- {}", gloss))
            .collect();

        if points.is_empty() {
            "Review clause carefully for exact obligations and restrictions.".to_string()
        } else {
            format!("Key obligations:\n{}", points.join("\n"))
        }
    }
}

fn generic(category: &str) -> Explanation {
    Explanation {
        category: category.to_string(),
        title: category.to_string(),
        explanation: format!("No specific guidance available for {}", category),
        key_points: vec!["Review the clause carefully in context".to_string()],
        tips: vec!["Consider consulting legal counsel for specialized clauses".to_string()],
        alternatives: vec!["Consult with legal counsel for alternative language".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleConfig;
    use pretty_assertions::assert_eq;
    use shared_types::Severity;

    fn explainer() -> Explainer {
        Explainer::new(&RuleConfig::embedded().unwrap().risks)
    }

    fn finding(category: &str) -> RiskFinding {
        RiskFinding {
            category: category.to_string(),
            category_name: category.to_string(),
            severity: Severity::Medium,
            clause_ordinal: 1,
            matched_text: String::new(),
            offset: 0,
            evidence: String::new(),
            description: String::new(),
            explanation: None,
        }
    }

    #[test]
    fn test_known_category() {
        let explanation = explainer().explain("termination");
        assert_eq!(explanation.title, "Termination");
        assert_eq!(
            explanation.explanation,
            "This clause specifies the conditions and procedures for ending the contract."
        );
        assert_eq!(explanation.key_points.len(), 4);
        assert_eq!(explanation.alternatives.len(), 3);
    }

    #[test]
    fn test_unknown_category_falls_back() {
        let explanation = explainer().explain("force_majeure");
        assert_eq!(
            explanation.explanation,
            "No specific guidance available for force_majeure"
        );
        assert_eq!(explanation.key_points, vec!["Review the clause carefully in context"]);
        assert_eq!(
            explanation.alternatives,
            vec!["Consult with legal counsel for alternative language"]
        );
    }

    #[test]
    fn test_annotate_and_dedupe() {
        let explainer = explainer();
        let mut findings = vec![finding("penalty"), finding("termination"), finding("penalty")];
        explainer.annotate(&mut findings);
        assert!(findings.iter().all(|f| f.explanation.is_some()));

        let explanations = explainer.explanations_for(&findings);
        let categories: Vec<&str> = explanations.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, vec!["penalty", "termination"]);
    }

    #[test]
    fn test_summarize_short_clause() {
        assert_eq!(
            Explainer::summarize_clause("Rent is due monthly."),
            "Short clause with limited scope."
        );
    }

    #[test]
    fn test_summarize_obligations() {
        let text = "The Tenant shall pay rent on the first day of each month and must not sublet the premises without the prior written consent of the Landlord.";
        assert_eq!(
            Explainer::summarize_clause(text),
            "Key obligations:\n- party is obligated to\n- party must\n- party is prohibited from\n- payment is required"
        );
    }

    #[test]
    fn test_summarize_without_keywords() {
        let text = "This document records the understanding reached by the parties regarding the subject matter described herein, effective upon signature.";
        assert_eq!(
            Explainer::summarize_clause(text),
            "Review clause carefully for exact obligations and restrictions."
        );
    }
}
