//! Keyword heuristics that turn a call transcript into symptom observations.

pub mod rules;

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Symptom, SymptomObservation};

pub use rules::{QualifierRule, QualifierRules};

/// Tokens kept on each side of a mention when building its context.
const CONTEXT_RADIUS: usize = 20;

static DEFAULT_EXTRACTOR: LazyLock<SymptomExtractor> = LazyLock::new(SymptomExtractor::default);

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

/// Extracts observations with the built-in keyword and qualifier rules.
pub fn extract(transcript: &str) -> Vec<SymptomObservation> {
    DEFAULT_EXTRACTOR.extract(transcript)
}

#[derive(Debug, Clone)]
pub struct SymptomExtractor {
    keywords: Vec<(Symptom, Regex)>,
    rules: QualifierRules,
}

impl Default for SymptomExtractor {
    fn default() -> Self {
        Self::with_rules(QualifierRules::default())
    }
}

struct Token<'a> {
    end: usize,
    text: &'a str,
}

impl SymptomExtractor {
    pub fn with_rules(rules: QualifierRules) -> Self {
        let keywords = Symptom::ALL
            .into_iter()
            .filter_map(|symptom| keyword_pattern(symptom).map(|re| (symptom, re)))
            .collect();
        Self { keywords, rules }
    }

    /// One observation per mentioned symptom, in `Symptom::ALL` order.
    pub fn extract(&self, transcript: &str) -> Vec<SymptomObservation> {
        let lower = transcript.to_lowercase();
        let tokens: Vec<Token<'_>> = TOKEN
            .find_iter(&lower)
            .map(|m| Token {
                end: m.end(),
                text: m.as_str(),
            })
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        // Leftmost hit across all variants is the first mention in transcript order.
        let mentions: Vec<(Symptom, usize)> = self
            .keywords
            .iter()
            .filter_map(|(symptom, re)| {
                let offset = re.find(&lower)?.start();
                let index = tokens.iter().position(|t| t.end > offset)?;
                Some((*symptom, index))
            })
            .collect();

        mentions
            .iter()
            .map(|&(symptom, index)| {
                let last = tokens.len() - 1;
                let lo = index.saturating_sub(CONTEXT_RADIUS);
                let hi = (index + CONTEXT_RADIUS).min(last);

                // Qualifiers belong to whichever mention they sit closest to.
                let prev = mentions.iter().map(|m| m.1).filter(|&i| i < index).max();
                let next = mentions.iter().map(|m| m.1).filter(|&i| i > index).min();
                let scope_lo = prev.map_or(lo, |p| lo.max((p + index) / 2 + 1));
                let scope_hi = next.map_or(hi, |n| hi.min((index + n) / 2));

                let scope = join(&tokens[scope_lo..=scope_hi]);
                SymptomObservation {
                    name: symptom,
                    severity: self.rules.severity_in(&scope),
                    duration: self.rules.duration_in(&scope),
                    context: join(&tokens[lo..=hi]),
                }
            })
            .collect()
    }
}

fn keyword_pattern(symptom: Symptom) -> Option<Regex> {
    let alternatives: Vec<String> = symptom
        .keywords()
        .iter()
        .map(|kw| {
            kw.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    match Regex::new(&alternatives.join("|")) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(symptom = symptom.as_str(), error = %e, "invalid keyword pattern");
            None
        }
    }
}

fn join(tokens: &[Token<'_>]) -> String {
    tokens
        .iter()
        .map(|t| t.text)
        .collect::<Vec<_>>()
        .join(" ")
}
