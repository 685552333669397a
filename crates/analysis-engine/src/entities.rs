//! Entity tagging: parties, dates, amounts, jurisdictions, contacts
//!
//! Each category is an independent regex pass. Matches are deduplicated by
//! text within a category (first offset kept); categories never suppress each
//! other.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{Entity, EntityCategory};

use crate::rules::EntityConfig;

/// Capitalized word, optionally ending in an abbreviation period
const NAME_WORD: &str = r"[A-Z][\w&'\-]*\.?";

const MONTH: &str = r"(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)\.?";

/// Leading words that make a corporate suffix a reference, not a name
const DETERMINERS: &[&str] = &["The", "This", "That", "Such", "Each", "Said", "Any"];

/// Abbreviations whose trailing period belongs to the name
const KEEP_PERIOD: &[&str] = &["Inc.", "Corp.", "Ltd.", "Co.", "L.L.C.", "L.P."];

lazy_static! {
    static ref BETWEEN_PARTIES: Regex = Regex::new(&format!(
        r"\bbetween[ \t]+(?:the[ \t]+)?({w}(?:,?[ \t]+{w}){{0,5}})(?:[^;\n]{{0,200}}?\band[ \t]+(?:the[ \t]+)?({w}(?:,?[ \t]+{w}){{0,5}}))?",
        w = NAME_WORD
    ))
    .unwrap();

    static ref CORPORATE_NAME: Regex = Regex::new(
        r"\b[A-Z][\w&'\-]*(?:[ \t]+[A-Z][\w&'\-]*){0,4},?[ \t]+(?:Inc\.|LLC\b|L\.L\.C\.|Ltd\.|Limited\b|Corp\.|Corporation\b|Company\b|Co\.|LLP\b|L\.P\.|PLC\b|GmbH\b)"
    )
    .unwrap();

    static ref DATE: Regex = Regex::new(&format!(
        r"\b(?:\d{{1,2}}/\d{{1,2}}/\d{{4}}|\d{{4}}-\d{{2}}-\d{{2}}|{m}[ \t]+\d{{1,2}}(?:st|nd|rd|th)?,?[ \t]+\d{{4}}|\d{{1,2}}(?:st|nd|rd|th)?[ \t]+(?:day[ \t]+of[ \t]+|of[ \t]+)?{m},?[ \t]+\d{{4}})\b",
        m = MONTH
    ))
    .unwrap();

    static ref CURRENCY: Regex = Regex::new(
        r"(?i)(?:[$€£][ \t]?\d[\d,]*(?:\.\d+)?(?:[ \t]+(?:thousand|million|billion)\b)?|\b(?:USD|EUR|GBP|CAD|AUD)[ \t]?\d[\d,]*(?:\.\d+)?|\b\d[\d,]*(?:\.\d+)?[ \t]+(?:(?:US|U\.S\.)[ \t]+)?(?:dollars|euros|pounds)\b)"
    )
    .unwrap();

    static ref PERCENTAGE: Regex =
        Regex::new(r"(?i)\b\d+(?:\.\d+)?(?:[ \t]?%|[ \t]+per[ \t]?cent\b)").unwrap();

    static ref EMAIL: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b").unwrap();

    static ref PHONE: Regex = Regex::new(
        r"(?:\+\d{1,3}[ \t.\-]?)?(?:\(\d{3}\)[ \t]?|\b\d{3}[ \t.\-])\d{3}[ \t.\-]\d{4}\b"
    )
    .unwrap();

    static ref URL: Regex = Regex::new(r#"\b(?:https?://|www\.)[^\s<>"]+"#).unwrap();
}

/// Regex-driven entity tagger
pub struct EntityTagger {
    jurisdiction: Option<Regex>,
    canonical: HashMap<String, String>,
}

impl EntityTagger {
    /// Build the tagger, compiling the jurisdiction dictionary into one
    /// alternation (longest names first so "West Virginia" beats "Virginia")
    pub fn new(config: &EntityConfig) -> Self {
        let mut names: Vec<&String> = config
            .jurisdictions
            .iter()
            .filter(|n| !n.trim().is_empty())
            .collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));

        let canonical = names
            .iter()
            .map(|n| (fold(n), n.trim().to_string()))
            .collect();

        let jurisdiction = if names.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = names
                .iter()
                .map(|n| {
                    n.split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .collect();
            // Escaped literals always compile
            Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).ok()
        };

        Self {
            jurisdiction,
            canonical,
        }
    }

    /// Tag every category, ordered by offset
    pub fn tag(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        entities.extend(self.parties(text));
        entities.extend(self.dates(text));
        entities.extend(self.amounts(text));
        entities.extend(self.jurisdictions(text));
        entities.extend(self.contacts(text));
        entities.sort_by_key(|e| (e.offset, e.category));
        entities
    }

    pub fn parties(&self, text: &str) -> Vec<Entity> {
        let mut found = Vec::new();

        for caps in BETWEEN_PARTIES.captures_iter(text) {
            for group in [caps.get(1), caps.get(2)].into_iter().flatten() {
                let name = clean_party(group.as_str());
                if name.split_whitespace().count() > 0 {
                    found.push(entity(EntityCategory::Party, name, group.start(), None));
                }
            }
        }

        for m in CORPORATE_NAME.find_iter(text) {
            let raw = m.as_str();
            let stripped = strip_determiner(raw);
            // "The Company", "This Corporation": a defined-term reference
            if stripped.split_whitespace().count() < 2 {
                continue;
            }
            let offset = m.start() + (raw.len() - stripped.len());
            found.push(entity(EntityCategory::Party, clean_party(stripped), offset, None));
        }

        dedupe(found)
    }

    pub fn dates(&self, text: &str) -> Vec<Entity> {
        dedupe(
            DATE.find_iter(text)
                .map(|m| entity(EntityCategory::Date, m.as_str().to_string(), m.start(), None))
                .collect(),
        )
    }

    pub fn amounts(&self, text: &str) -> Vec<Entity> {
        let currency = CURRENCY.find_iter(text).map(|m| {
            let value = m.as_str().trim_end_matches([',', '.']).to_string();
            entity(EntityCategory::Amount, value, m.start(), Some("currency"))
        });
        let percentage = PERCENTAGE.find_iter(text).map(|m| {
            entity(
                EntityCategory::Amount,
                m.as_str().to_string(),
                m.start(),
                Some("percentage"),
            )
        });
        dedupe(currency.chain(percentage).collect())
    }

    pub fn jurisdictions(&self, text: &str) -> Vec<Entity> {
        let Some(re) = &self.jurisdiction else {
            return Vec::new();
        };
        dedupe(
            re.find_iter(text)
                .map(|m| {
                    let name = self
                        .canonical
                        .get(&fold(m.as_str()))
                        .cloned()
                        .unwrap_or_else(|| m.as_str().to_string());
                    entity(EntityCategory::Jurisdiction, name, m.start(), None)
                })
                .collect(),
        )
    }

    pub fn contacts(&self, text: &str) -> Vec<Entity> {
        let mut found = Vec::new();
        let mut email_spans = Vec::new();

        for m in EMAIL.find_iter(text) {
            email_spans.push(m.range());
            found.push(entity(
                EntityCategory::Contact,
                m.as_str().to_string(),
                m.start(),
                Some("email"),
            ));
        }
        for m in PHONE.find_iter(text) {
            found.push(entity(
                EntityCategory::Contact,
                m.as_str().to_string(),
                m.start(),
                Some("phone"),
            ));
        }
        for m in URL.find_iter(text) {
            if email_spans.iter().any(|span| span.contains(&m.start())) {
                continue;
            }
            let url = m
                .as_str()
                .trim_end_matches(['.', ',', ';', ':', ')', '!', '?', '\'', '"']);
            found.push(entity(
                EntityCategory::Contact,
                url.to_string(),
                m.start(),
                Some("url"),
            ));
        }

        dedupe(found)
    }
}

fn entity(category: EntityCategory, text: String, offset: usize, kind: Option<&str>) -> Entity {
    Entity {
        category,
        text,
        offset,
        kind: kind.map(String::from),
    }
}

/// Keep the first occurrence of each text, ordered by offset
fn dedupe(mut entities: Vec<Entity>) -> Vec<Entity> {
    entities.sort_by_key(|e| e.offset);
    let mut seen = HashSet::new();
    entities.retain(|e| seen.insert(e.text.clone()));
    entities
}

fn strip_determiner(name: &str) -> &str {
    DETERMINERS
        .iter()
        .find_map(|d| {
            name.strip_prefix(d)
                .filter(|rest| rest.starts_with([' ', '\t']))
                .map(|rest| rest.trim_start())
        })
        .unwrap_or(name)
}

/// Drop a trailing comma or sentence period from a captured name
fn clean_party(raw: &str) -> String {
    let name = raw.trim().trim_end_matches(',');
    if name.ends_with('.') && !KEEP_PERIOD.iter().any(|abbr| name.ends_with(abbr)) {
        return name.trim_end_matches('.').to_string();
    }
    name.to_string()
}

fn fold(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
