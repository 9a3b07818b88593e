use regex::Regex;

use crate::models::Severity;

/// A pattern paired with the label it assigns when it matches.
#[derive(Debug, Clone)]
pub struct QualifierRule<L> {
    pub pattern: Regex,
    pub label: L,
}

impl<L> QualifierRule<L> {
    pub fn new(pattern: &str, label: L) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            label,
        })
    }
}

/// Severity and duration matchers applied to the text around a symptom mention.
///
/// Rules are tried in order and the first hit wins, so severity rules must be
/// listed from most to least severe.
#[derive(Debug, Clone)]
pub struct QualifierRules {
    pub severity: Vec<QualifierRule<Severity>>,
    /// Labels name the rule; the reported duration is the matched text.
    pub duration: Vec<QualifierRule<&'static str>>,
}

impl QualifierRules {
    pub fn severity_in(&self, text: &str) -> Option<Severity> {
        self.severity
            .iter()
            .find(|rule| rule.pattern.is_match(text))
            .map(|rule| rule.label)
    }

    pub fn duration_in(&self, text: &str) -> Option<String> {
        self.duration
            .iter()
            .find_map(|rule| rule.pattern.find(text))
            .map(|m| m.as_str().to_string())
    }
}

impl Default for QualifierRules {
    fn default() -> Self {
        let severity = [
            (
                r"(?i)\b(?:severe|intense|very|extremely|worst|unbearable|high)",
                Severity::High,
            ),
            (r"(?i)\b(?:moderate|medium|somewhat|quite)", Severity::Moderate),
            (r"(?i)\b(?:mild|slight|little|minor)", Severity::Mild),
        ];
        let duration = [
            (r"(?i)\b\d+\s*(?:days?|weeks?|hours?)\b", "count"),
            (
                r"(?i)\b(?:few|couple of|several)\s+(?:days?|weeks?|hours?)\b",
                "approximate",
            ),
            (
                r"(?i)\b(?:since|for)\s+(?:yesterday|morning|afternoon|evening|tonight)\b",
                "since",
            ),
        ];

        // Literal patterns; see test_default_rules_compile.
        Self {
            severity: severity
                .into_iter()
                .filter_map(|(p, label)| QualifierRule::new(p, label).ok())
                .collect(),
            duration: duration
                .into_iter()
                .filter_map(|(p, label)| QualifierRule::new(p, label).ok())
                .collect(),
        }
    }
}
