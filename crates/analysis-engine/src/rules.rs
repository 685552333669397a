//! Rule tables for risk scoring, classification and entity tagging
//!
//! The tables are data, not code: the embedded defaults live in
//! `rules/default_rules.toml` and a file with the same layout can replace
//! them at startup.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_types::Severity;
use thiserror::Error;

const DEFAULT_RULES: &str = include_str!("../rules/default_rules.toml");

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Failed to read rules file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid pattern in risk category '{category}': {source}")]
    Pattern {
        category: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid rules: {0}")]
    Invalid(String),
}

/// Complete rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub entities: EntityConfig,
    #[serde(rename = "risk", default)]
    pub risks: Vec<RiskRule>,
    #[serde(rename = "contract_type", default)]
    pub contract_types: Vec<ContractTypeRule>,
}

impl RuleConfig {
    /// The rule tables compiled into the binary
    pub fn embedded() -> Result<Self, RuleError> {
        Self::from_toml_str(DEFAULT_RULES)
    }

    /// Load and validate rules from a TOML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate rules from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self, RuleError> {
        let config: RuleConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<(), RuleError> {
        self.scoring.validate()?;

        let mut ids = HashSet::new();
        for rule in &self.risks {
            if rule.id.trim().is_empty() {
                return Err(RuleError::Invalid("risk category with empty id".into()));
            }
            if !ids.insert(rule.id.as_str()) {
                return Err(RuleError::Invalid(format!(
                    "duplicate risk category '{}'",
                    rule.id
                )));
            }
            if rule.patterns.is_empty() {
                return Err(RuleError::Invalid(format!(
                    "risk category '{}' has no patterns",
                    rule.id
                )));
            }
            for pattern in &rule.patterns {
                Regex::new(pattern).map_err(|source| RuleError::Pattern {
                    category: rule.id.clone(),
                    source,
                })?;
            }
        }

        let mut names = HashSet::new();
        for profile in &self.contract_types {
            if !names.insert(profile.name.as_str()) {
                return Err(RuleError::Invalid(format!(
                    "duplicate contract type '{}'",
                    profile.name
                )));
            }
            if profile.keywords.is_empty() {
                return Err(RuleError::Invalid(format!(
                    "contract type '{}' has no keywords",
                    profile.name
                )));
            }
            if let Some(bad) = profile
                .keywords
                .iter()
                .find(|k| k.term.trim().is_empty() || !(k.weight > 0.0))
            {
                return Err(RuleError::Invalid(format!(
                    "contract type '{}' has invalid keyword '{}' (weight {})",
                    profile.name, bad.term, bad.weight
                )));
            }
        }

        Ok(())
    }

    pub fn risk(&self, id: &str) -> Option<&RiskRule> {
        self.risks.iter().find(|r| r.id == id)
    }
}

/// Severity weights and level thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    /// Summed weight that maps to a score of 100
    #[serde(default = "default_saturation")]
    pub saturation: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: u8,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: u8,
}

fn default_low() -> f64 {
    1.0
}

fn default_medium() -> f64 {
    3.0
}

fn default_high() -> f64 {
    5.0
}

fn default_saturation() -> f64 {
    25.0
}

fn default_medium_threshold() -> u8 {
    40
}

fn default_high_threshold() -> u8 {
    70
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            low: default_low(),
            medium: default_medium(),
            high: default_high(),
            saturation: default_saturation(),
            medium_threshold: default_medium_threshold(),
            high_threshold: default_high_threshold(),
        }
    }
}

impl ScoringConfig {
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
        }
    }

    fn validate(&self) -> Result<(), RuleError> {
        if !(self.saturation > 0.0) {
            return Err(RuleError::Invalid("scoring.saturation must be positive".into()));
        }
        if [self.low, self.medium, self.high].iter().any(|w| !(*w >= 0.0)) {
            return Err(RuleError::Invalid(
                "severity weights must be non-negative".into(),
            ));
        }
        if self.medium_threshold > self.high_threshold || self.high_threshold > 100 {
            return Err(RuleError::Invalid(format!(
                "thresholds must satisfy medium <= high <= 100 (got {} and {})",
                self.medium_threshold, self.high_threshold
            )));
        }
        Ok(())
    }
}

/// Dictionaries for entity tagging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityConfig {
    #[serde(default)]
    pub jurisdictions: Vec<String>,
}

/// One risk category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRule {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub description: String,
    /// Regular expressions, matched case-insensitively
    pub patterns: Vec<String>,
    pub explanation: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Keyword profile for one contract type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractTypeRule {
    pub name: String,
    pub description: String,
    /// Distinct keywords required before the type is considered
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,
    pub keywords: Vec<Keyword>,
}

fn default_min_matches() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}
