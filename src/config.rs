//! Tunable allow/deny lists and the builders that carry them into a
//! [`ContentGuard`].
//!
//! Every list the pipeline consults is exposed as a named constant so a
//! deployer can extend it through [`SanitizationConfig`] without touching the
//! pipeline itself.

use std::collections::HashSet;

use crate::detect::ThreatDetector;
use crate::guard::ContentGuard;
use crate::link::LinkPolicy;
use crate::sanitizer::{AllowListSanitizer, PatternScrubber, ScrubMode, SanitizerPipeline};

/// Tags that survive the allow-list pass.
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "em", "u", "s", "sub", "sup", "h1", "h2", "h3", "h4", "h5", "h6", "ul",
    "ol", "li", "blockquote", "pre", "code", "a", "img", "table", "thead", "tbody", "tr", "th",
    "td", "div", "span",
];

/// Attributes that survive the allow-list pass on any allowed tag.
pub const DEFAULT_ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "target", "rel", "src", "alt", "width", "height", "class", "style", "colspan",
    "rowspan",
];

/// Tags removed together with their whole subtree.
pub const DEFAULT_FORBIDDEN_TAGS: &[&str] = &[
    "script", "object", "embed", "form", "input", "button", "textarea", "select", "option",
];

/// Attributes always dropped, even when also allow-listed.
///
/// Any attribute named `on*` is treated as forbidden regardless of this list.
pub const DEFAULT_FORBIDDEN_ATTRIBUTES: &[&str] = &[
    "onerror",
    "onload",
    "onclick",
    "onmouseover",
    "onfocus",
    "onblur",
    "onchange",
    "onsubmit",
];

/// Schemes a URI-valued attribute may carry through the allow-list pass.
pub const DEFAULT_ALLOWED_URI_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Schemes never admitted as an explicit link.
pub const DENIED_LINK_SCHEMES: &[&str] = &["ftp", "file", "mailto"];

/// Hosts never admitted as an explicit link.
pub const DENIED_LINK_DOMAINS: &[&str] = &["example-phishing.com", "malicious-site.net"];

/// Hosts never auto-linked. Kept separate from [`DENIED_LINK_DOMAINS`].
pub const DENIED_AUTOLINK_DOMAINS: &[&str] =
    &["example-no-autolink.com", "another-no-autolink.com"];

/// Protocols an editor link context allows by default.
pub const DEFAULT_LINK_PROTOCOLS: &[&str] = &["http", "https"];

/// Scheme assumed for candidates written without one.
pub const DEFAULT_PROTOCOL: &str = "https";

fn lowercase_set<I, T>(items: I) -> HashSet<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_ascii_lowercase())
        .collect()
}

/// Immutable description of what the allow-list pass keeps.
///
/// Built once with the fluent methods below, then shared by reference. Names
/// are compared case-insensitively.
///
/// # Example
///
/// ```
/// use html_guard::SanitizationConfig;
///
/// let config = SanitizationConfig::default()
///     .allow_tags(["figure", "figcaption"])
///     .forbid_tags(["iframe"]);
/// assert!(config.is_tag_allowed("FIGURE"));
/// assert!(config.is_tag_forbidden("iframe"));
/// ```
#[derive(Clone, Debug)]
pub struct SanitizationConfig {
    allowed_tags: HashSet<String>,
    allowed_attributes: HashSet<String>,
    forbidden_tags: HashSet<String>,
    forbidden_attributes: HashSet<String>,
    allowed_uri_schemes: HashSet<String>,
    sanitize_dom: bool,
    keep_content: bool,
}

impl SanitizationConfig {
    /// A configuration that allows nothing: every element is unwrapped to its
    /// text and every attribute is dropped.
    pub fn empty() -> Self {
        Self {
            allowed_tags: HashSet::new(),
            allowed_attributes: HashSet::new(),
            forbidden_tags: HashSet::new(),
            forbidden_attributes: HashSet::new(),
            allowed_uri_schemes: HashSet::new(),
            sanitize_dom: true,
            keep_content: true,
        }
    }

    /// Add tags to the allow-list.
    pub fn allow_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.allowed_tags.extend(lowercase_set(tags));
        self
    }

    /// Add attributes to the allow-list.
    pub fn allow_attributes<I, T>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.allowed_attributes.extend(lowercase_set(attrs));
        self
    }

    /// Add tags whose whole subtree is deleted.
    pub fn forbid_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.forbidden_tags.extend(lowercase_set(tags));
        self
    }

    /// Add attributes that are dropped even when allow-listed.
    pub fn forbid_attributes<I, T>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.forbidden_attributes.extend(lowercase_set(attrs));
        self
    }

    /// Add schemes that URI-valued attributes may use.
    pub fn allow_uri_schemes<I, T>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.allowed_uri_schemes.extend(lowercase_set(schemes));
        self
    }

    /// Drop `id`/`name` values that would shadow document properties.
    pub fn sanitize_dom(mut self, enabled: bool) -> Self {
        self.sanitize_dom = enabled;
        self
    }

    /// Unwrap non-allow-listed elements (`true`) or delete them with their
    /// content (`false`).
    pub fn keep_content(mut self, enabled: bool) -> Self {
        self.keep_content = enabled;
        self
    }

    pub fn is_tag_allowed(&self, tag: &str) -> bool {
        self.allowed_tags.contains(&tag.to_ascii_lowercase())
    }

    pub fn is_tag_forbidden(&self, tag: &str) -> bool {
        self.forbidden_tags.contains(&tag.to_ascii_lowercase())
    }

    /// Whether an attribute survives: allow-listed, not forbidden, and not an
    /// inline event handler.
    pub fn is_attribute_allowed(&self, attr: &str) -> bool {
        let attr = attr.to_ascii_lowercase();
        !attr.starts_with("on")
            && self.allowed_attributes.contains(&attr)
            && !self.forbidden_attributes.contains(&attr)
    }

    pub fn is_uri_scheme_allowed(&self, scheme: &str) -> bool {
        self.allowed_uri_schemes
            .contains(&scheme.to_ascii_lowercase())
    }

    pub fn sanitizes_dom(&self) -> bool {
        self.sanitize_dom
    }

    pub fn keeps_content(&self) -> bool {
        self.keep_content
    }
}

impl Default for SanitizationConfig {
    /// The rich-text editor defaults built from the `DEFAULT_*` constants.
    fn default() -> Self {
        Self::empty()
            .allow_tags(DEFAULT_ALLOWED_TAGS)
            .allow_attributes(DEFAULT_ALLOWED_ATTRIBUTES)
            .forbid_tags(DEFAULT_FORBIDDEN_TAGS)
            .forbid_attributes(DEFAULT_FORBIDDEN_ATTRIBUTES)
            .allow_uri_schemes(DEFAULT_ALLOWED_URI_SCHEMES)
    }
}

/// Builder for configuring a [`ContentGuard`].
///
/// # Example
///
/// ```
/// use html_guard::{ContentGuardBuilder, SanitizationConfig, ScrubMode};
///
/// let guard = ContentGuardBuilder::new()
///     .config(SanitizationConfig::default().allow_tags(["mark"]))
///     .scrub_mode(ScrubMode::FixedPoint)
///     .build();
/// assert_eq!(guard.sanitize("<mark>hi</mark>"), "<mark>hi</mark>");
/// ```
pub struct ContentGuardBuilder {
    config: SanitizationConfig,
    detector: ThreatDetector,
    scrub_mode: ScrubMode,
    link_policy: LinkPolicy,
}

impl ContentGuardBuilder {
    /// Create a builder with the default lists, the built-in threat rules,
    /// fixed-point scrubbing and the default link policy.
    pub fn new() -> Self {
        Self {
            config: SanitizationConfig::default(),
            detector: ThreatDetector::default(),
            scrub_mode: ScrubMode::default(),
            link_policy: LinkPolicy::default(),
        }
    }

    pub fn config(mut self, config: SanitizationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn detector(mut self, detector: ThreatDetector) -> Self {
        self.detector = detector;
        self
    }

    /// How often the pattern scrubber reapplies its rewrites.
    pub fn scrub_mode(mut self, mode: ScrubMode) -> Self {
        self.scrub_mode = mode;
        self
    }

    pub fn link_policy(mut self, policy: LinkPolicy) -> Self {
        self.link_policy = policy;
        self
    }

    /// Consume the builder and assemble the allow-list sanitizer and pattern
    /// scrubber into the guard's pipeline.
    pub fn build(self) -> ContentGuard {
        let mut pipeline = SanitizerPipeline::new();
        pipeline.add(AllowListSanitizer::new(self.config));
        pipeline.add(PatternScrubber::new(self.scrub_mode));
        ContentGuard::new(pipeline, self.detector, self.link_policy)
    }
}

impl Default for ContentGuardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_editor_tags() {
        let config = SanitizationConfig::default();
        for tag in DEFAULT_ALLOWED_TAGS {
            assert!(config.is_tag_allowed(tag), "{tag} should be allowed");
        }
        assert!(!config.is_tag_allowed("script"));
        assert!(config.is_tag_forbidden("script"));
        assert!(!config.is_tag_forbidden("iframe"));
    }

    #[test]
    fn names_are_case_insensitive() {
        let config = SanitizationConfig::empty().allow_tags(["Mark"]);
        assert!(config.is_tag_allowed("MARK"));
        assert!(config.is_tag_allowed("mark"));
    }

    #[test]
    fn forbidden_attribute_wins_over_allowed() {
        let config = SanitizationConfig::empty()
            .allow_attributes(["title", "onclick"])
            .forbid_attributes(["title"]);
        assert!(!config.is_attribute_allowed("title"));
        assert!(!config.is_attribute_allowed("onclick"));
    }

    #[test]
    fn event_handlers_never_allowed() {
        let config = SanitizationConfig::default().allow_attributes(["onpointerdown"]);
        assert!(!config.is_attribute_allowed("onpointerdown"));
        assert!(!config.is_attribute_allowed("ONLOAD"));
        assert!(config.is_attribute_allowed("href"));
    }

    #[test]
    fn empty_config_allows_nothing() {
        let config = SanitizationConfig::empty();
        assert!(!config.is_tag_allowed("p"));
        assert!(!config.is_attribute_allowed("href"));
        assert!(!config.is_uri_scheme_allowed("https"));
        assert!(config.keeps_content());
        assert!(config.sanitizes_dom());
    }

    #[test]
    fn flags_toggle() {
        let config = SanitizationConfig::default()
            .keep_content(false)
            .sanitize_dom(false);
        assert!(!config.keeps_content());
        assert!(!config.sanitizes_dom());
    }
}
