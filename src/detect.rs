//! Read-only threat detection over raw, pre-sanitization HTML.
//!
//! The detector only reports; it never changes what the pipeline outputs.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

/// Built-in detection rules, in evaluation order.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("JavaScript Protocol", r"(?i)javascript:"),
    ("VBScript Protocol", r"(?i)vbscript:"),
    ("HTML Data URI", r"(?i)data:text/html"),
    ("Application Data URI", r"(?i)data:application"),
    ("Script Tag", r"(?i)<script"),
    ("CSS Expression", r"(?i)expression\s*\("),
    ("CSS Behavior", r"(?i)behavior\s*:"),
    ("Mozilla Binding", r"(?i)-moz-binding"),
    ("CSS Import", r"(?i)@import"),
    ("Unicode Escape", r"(?i)\\u00"),
    ("Hex Entity", r"(?i)&#x"),
    ("Event Handler", r"(?i)on\w+\s*="),
];

static BUILTIN: LazyLock<ThreatDetector> = LazyLock::new(|| {
    ThreatDetector::try_new(BUILTIN_PATTERNS.iter().copied())
        .expect("threat rules: hardcoded regexes are valid")
});

/// A named detection rule.
#[derive(Clone, Debug)]
pub struct ThreatPattern {
    name: String,
    matcher: Regex,
}

impl ThreatPattern {
    /// Compile a rule. Fails with [`GuardError::InvalidPattern`](crate::GuardError::InvalidPattern)
    /// if `pattern` is not a valid regex.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            matcher: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, html: &str) -> bool {
        self.matcher.is_match(html)
    }
}

/// Category names observed in one input, in rule order. Empty means clean.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreatReport {
    categories: Vec<String>,
}

impl ThreatReport {
    pub fn is_clean(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn into_categories(self) -> Vec<String> {
        self.categories
    }
}

/// An ordered set of [`ThreatPattern`]s evaluated against raw input.
///
/// # Example
///
/// ```
/// use html_guard::ThreatDetector;
///
/// let report = ThreatDetector::default().detect(r#"<img src=x onerror="alert(1)">"#);
/// assert_eq!(report.categories(), ["Event Handler"]);
/// ```
#[derive(Clone, Debug)]
pub struct ThreatDetector {
    patterns: Vec<ThreatPattern>,
}

impl ThreatDetector {
    pub fn new(patterns: Vec<ThreatPattern>) -> Self {
        Self { patterns }
    }

    /// Build a detector from `(name, regex)` pairs.
    pub fn try_new<'a, I>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let patterns = rules
            .into_iter()
            .map(|(name, pattern)| ThreatPattern::new(name, pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[ThreatPattern] {
        &self.patterns
    }

    /// Report every rule that matches `html` at least once.
    pub fn detect(&self, html: &str) -> ThreatReport {
        let categories = self
            .patterns
            .iter()
            .filter(|p| p.matches(html))
            .map(|p| p.name.clone())
            .collect();
        ThreatReport { categories }
    }
}

impl Default for ThreatDetector {
    /// The built-in rule set.
    fn default() -> Self {
        BUILTIN.clone()
    }
}

/// Run the built-in rules over `raw`. A missing input is reported clean.
pub fn detect<'a>(raw: impl Into<Option<&'a str>>) -> ThreatReport {
    match raw.into() {
        Some(html) => BUILTIN.detect(html),
        None => ThreatReport::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_input_reports_nothing() {
        let report = detect("<p>Hello <strong>world</strong></p>");
        assert!(report.is_clean());
        assert_eq!(report.len(), 0);
        assert!(detect(None).is_clean());
    }

    #[test]
    fn reports_in_rule_order() {
        let html = r#"<p onclick="x()"><script>a</script><a href="JavaScript:b">c</a></p>"#;
        let report = detect(html);
        assert_eq!(
            report.categories(),
            ["JavaScript Protocol", "Script Tag", "Event Handler"]
        );
    }

    #[test]
    fn one_entry_per_rule() {
        let report = detect("javascript:a javascript:b JAVASCRIPT:c");
        assert_eq!(report.categories(), ["JavaScript Protocol"]);
    }

    #[test]
    fn detects_css_and_encoding_tricks() {
        let html = concat!(
            "<style>@import url(x); a { behavior: url(b.htc); -moz-binding: url(c) }</style>",
            r#"<p style="width: expression(1)">&#x6a;ava \u003cb</p>"#,
        );
        let report = detect(html);
        for category in [
            "CSS Expression",
            "CSS Behavior",
            "Mozilla Binding",
            "CSS Import",
            "Unicode Escape",
            "Hex Entity",
        ] {
            assert!(report.contains(category), "missing {category}");
        }
        assert!(!report.contains("Script Tag"));
    }

    #[test]
    fn detects_data_uris() {
        let report = detect(
            r#"<a href="data:text/html,x">a</a><a href="data:application/pdf,y">b</a><img src="data:image/png;base64,AA">"#,
        );
        assert_eq!(
            report.categories(),
            ["HTML Data URI", "Application Data URI"]
        );
    }

    #[test]
    fn custom_detector() {
        let detector = ThreatDetector::try_new([("Iframe", r"(?i)<iframe")]).unwrap();
        assert_eq!(detector.patterns().len(), 1);
        assert_eq!(detector.patterns()[0].name(), "Iframe");
        assert!(detector.detect("<IFRAME src=x>").contains("Iframe"));
        assert!(detector.detect("<script>").is_clean());
    }

    #[test]
    fn invalid_custom_pattern_is_an_error() {
        assert!(ThreatDetector::try_new([("Broken", "[unclosed")]).is_err());
    }

    #[test]
    fn builtin_rule_count() {
        assert_eq!(ThreatDetector::default().patterns().len(), 12);
    }
}
