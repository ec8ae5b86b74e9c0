//! Tagged-line classification for monitored stdout.
//!
//! A [`LineClassifier`] is an ordered list of `(pattern, kind)` rules evaluated against each line.
//! The first matching rule wins, so authorization rules must come before generic error rules.

/// What a single stdout line means for the running conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The tool rejected its credentials.
    Authorization,
    /// The tool reported an error or an internal exception.
    Error,
}

/// A substring rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub kind: LineKind,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, kind: LineKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
        }
    }
}

/// Markers reported by tools that failed to authorize or authenticate.
pub const AUTHORIZATION_MARKERS: &[&str] = &[
    "Failed to authorize",
    "failed to authorize",
    "Authorization failed",
    "authorization failed",
    "Authentication failed",
    "authentication failed",
    "Unauthorized",
    "UNAUTHORIZED",
];

/// Markers that signal a terminal error.
pub const ERROR_MARKERS: &[&str] = &["Internal exception", "InternalException", "ERROR", "Error"];

/// Ordered rule list; the first rule whose pattern occurs in a line decides its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClassifier {
    rules: Vec<Rule>,
}

impl Default for LineClassifier {
    fn default() -> Self {
        let rules = AUTHORIZATION_MARKERS
            .iter()
            .map(|m| Rule::new(*m, LineKind::Authorization))
            .chain(ERROR_MARKERS.iter().map(|m| Rule::new(*m, LineKind::Error)))
            .collect();
        Self { rules }
    }
}

impl LineClassifier {
    /// Build a classifier from an explicit rule list, evaluated in order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Insert a rule ahead of all existing rules.
    pub fn with_priority_rule(mut self, rule: Rule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Append a rule after all existing rules.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify one line. `None` means an ordinary progress line.
    pub fn classify(&self, line: &str) -> Option<LineKind> {
        self.rules
            .iter()
            .find(|rule| line.contains(rule.pattern.as_str()))
            .map(|rule| rule.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_unclassified() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify("Step1 OK"), None);
        assert_eq!(classifier.classify("Processing..."), None);
    }

    #[test]
    fn test_error_markers() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify("ERROR: cannot open"), Some(LineKind::Error));
        assert_eq!(classifier.classify("Error while reading"), Some(LineKind::Error));
        assert_eq!(
            classifier.classify("caught Internal exception in worker"),
            Some(LineKind::Error)
        );
        // Matching is case-sensitive.
        assert_eq!(classifier.classify("no errors found"), None);
    }

    #[test]
    fn test_authorization_wins_over_error() {
        let classifier = LineClassifier::default();
        assert_eq!(
            classifier.classify("ERROR: Authentication failed for user"),
            Some(LineKind::Authorization)
        );
        assert_eq!(
            classifier.classify("Failed to authorize: bad token"),
            Some(LineKind::Authorization)
        );
    }

    #[test]
    fn test_first_match_wins() {
        let classifier = LineClassifier::new(vec![
            Rule::new("WARN", LineKind::Error),
            Rule::new("WARN", LineKind::Authorization),
        ]);
        assert_eq!(classifier.classify("WARN: x"), Some(LineKind::Error));

        let classifier = classifier.with_priority_rule(Rule::new("WARN", LineKind::Authorization));
        assert_eq!(classifier.classify("WARN: x"), Some(LineKind::Authorization));
    }

    #[test]
    fn test_with_rule_appends() {
        let classifier = LineClassifier::new(Vec::new()).with_rule(Rule::new("FATAL", LineKind::Error));
        assert_eq!(classifier.rules().len(), 1);
        assert_eq!(classifier.classify("FATAL crash"), Some(LineKind::Error));
    }
}
