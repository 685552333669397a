//! Contract type classification by weighted keyword profiles

use regex::Regex;
use shared_types::{ClassificationResult, TypeScore};

use crate::patterns::keyword_pattern;
use crate::rules::{ContractTypeRule, RuleError};

struct CompiledKeyword {
    term: String,
    weight: f64,
    pattern: Regex,
}

struct Profile {
    name: String,
    description: String,
    min_matches: usize,
    keywords: Vec<CompiledKeyword>,
}

/// Keyword-profile classifier
pub struct Classifier {
    profiles: Vec<Profile>,
}

impl Classifier {
    pub fn new(rules: &[ContractTypeRule]) -> Result<Self, RuleError> {
        let profiles = rules
            .iter()
            .map(|rule| {
                let keywords = rule
                    .keywords
                    .iter()
                    .map(|k| {
                        Regex::new(&keyword_pattern(&k.term))
                            .map(|pattern| CompiledKeyword {
                                term: k.term.clone(),
                                weight: k.weight,
                                pattern,
                            })
                            .map_err(|source| RuleError::Pattern {
                                category: rule.name.clone(),
                                source,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Profile {
                    name: rule.name.clone(),
                    description: rule.description.clone(),
                    min_matches: rule.min_matches,
                    keywords,
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        Ok(Self { profiles })
    }

    /// Pick the best-matching contract type
    ///
    /// Only types meeting their `min_matches` are eligible. The highest matched
    /// weight wins, ties go to the type declared first. Confidence is the
    /// matched share of the winner's total keyword weight.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let mut scored: Vec<(usize, TypeScore)> = self
            .profiles
            .iter()
            .enumerate()
            .filter_map(|(index, profile)| {
                let score = profile.score(text);
                (!score.matched_keywords.is_empty()).then_some((index, score))
            })
            .collect();

        // Stable: equal weights keep declaration order
        scored.sort_by(|(_, a), (_, b)| b.matched_weight.total_cmp(&a.matched_weight));

        let best = scored.iter().find(|(index, score)| {
            score.matched_keywords.len() >= self.profiles[*index].min_matches.max(1)
        });

        let Some((index, best)) = best else {
            tracing::debug!("no contract type profile matched");
            return ClassificationResult {
                scores: scored.into_iter().map(|(_, s)| s).collect(),
                ..ClassificationResult::unclassified()
            };
        };

        let profile = &self.profiles[*index];
        let confidence = if best.total_weight > 0.0 {
            (best.matched_weight / best.total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        ClassificationResult {
            contract_type: profile.name.clone(),
            confidence,
            description: profile.description.clone(),
            scores: scored.into_iter().map(|(_, s)| s).collect(),
        }
    }
}

impl Profile {
    fn score(&self, text: &str) -> TypeScore {
        let matched: Vec<&CompiledKeyword> = self
            .keywords
            .iter()
            .filter(|k| k.pattern.is_match(text))
            .collect();

        TypeScore {
            contract_type: self.name.clone(),
            matched_weight: matched.iter().map(|k| k.weight).sum(),
            total_weight: self.keywords.iter().map(|k| k.weight).sum(),
            matched_keywords: matched.iter().map(|k| k.term.clone()).collect(),
        }
    }
}
