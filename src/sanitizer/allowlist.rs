//! Tree-based allow-list sanitizer.

use scraper::Html;
use scraper::node::Element;

use super::Sanitizer;
use super::serialize::{Disposition, serialize_fragment};
use crate::config::SanitizationConfig;

/// Attributes whose value is interpreted as a URI.
const URI_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "action",
    "formaction",
    "xlink:href",
    "background",
    "poster",
    "cite",
];

/// `id`/`name` values that would shadow a document or window property.
const CLOBBERABLE_NAMES: &[&str] = &[
    "action",
    "anchors",
    "attributes",
    "body",
    "childnodes",
    "children",
    "close",
    "cookie",
    "createelement",
    "defaultview",
    "documentelement",
    "domain",
    "firstchild",
    "forms",
    "frames",
    "getelementbyid",
    "getelementsbytagname",
    "head",
    "images",
    "implementation",
    "innerhtml",
    "length",
    "links",
    "location",
    "name",
    "nodename",
    "nodetype",
    "open",
    "opener",
    "outerhtml",
    "ownerdocument",
    "parent",
    "parentnode",
    "queryselector",
    "queryselectorall",
    "scripts",
    "self",
    "submit",
    "textcontent",
    "top",
    "window",
    "write",
];

/// Sanitizer that parses markup and rebuilds it from allow-listed parts only.
///
/// Elements outside the allow-list are unwrapped (their children are kept in
/// place) unless they are forbidden, in which case the whole subtree goes.
///
/// # Example
///
/// ```
/// use html_guard::{AllowListSanitizer, SanitizationConfig, Sanitizer};
///
/// let sanitizer = AllowListSanitizer::new(SanitizationConfig::default());
/// let html = r#"<p onclick="x()">safe<script>alert(1)</script>more</p>"#;
/// assert_eq!(sanitizer.sanitize(html), "<p>safemore</p>");
/// ```
pub struct AllowListSanitizer {
    config: SanitizationConfig,
}

impl AllowListSanitizer {
    pub fn new(config: SanitizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SanitizationConfig {
        &self.config
    }
}

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> String {
        sanitize(html, &self.config)
    }
}

/// Rebuild `raw` keeping only what `config` allows.
///
/// Accepts `&str` or `Option<&str>`; a missing or empty input yields an empty
/// string. Malformed markup is parsed the way a browser would and never
/// causes an error.
pub fn sanitize<'a>(raw: impl Into<Option<&'a str>>, config: &SanitizationConfig) -> String {
    let Some(raw) = raw.into().filter(|s| !s.is_empty()) else {
        return String::new();
    };

    let document = Html::parse_fragment(raw);
    let out = serialize_fragment(&document, |el| disposition(config, el));
    tracing::debug!("Allow-list pass: {} bytes in, {} bytes out", raw.len(), out.len());
    out
}

fn disposition<'a>(config: &SanitizationConfig, el: &'a Element) -> Disposition<'a> {
    let tag = el.name();
    if config.is_tag_forbidden(tag) {
        return Disposition::Remove;
    }
    if !config.is_tag_allowed(tag) {
        return if config.keeps_content() {
            Disposition::Unwrap
        } else {
            Disposition::Remove
        };
    }

    let attrs = el
        .attrs()
        .filter(|&(name, value)| keep_attribute(config, tag, name, value))
        .collect();
    Disposition::Keep(attrs)
}

fn keep_attribute(config: &SanitizationConfig, tag: &str, name: &str, value: &str) -> bool {
    if !config.is_attribute_allowed(name) {
        return false;
    }
    let name = name.to_ascii_lowercase();
    if URI_ATTRIBUTES.contains(&name.as_str()) && !is_safe_uri(config, tag, &name, value) {
        return false;
    }
    if config.sanitizes_dom()
        && (name == "id" || name == "name")
        && CLOBBERABLE_NAMES.contains(&value.to_ascii_lowercase().as_str())
    {
        return false;
    }
    true
}

/// Whether a URI attribute value is relative or uses an allowed scheme.
///
/// Whitespace and control characters are ignored when locating the scheme,
/// since browsers strip them before resolving.
fn is_safe_uri(config: &SanitizationConfig, tag: &str, attr: &str, value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect();

    let Some(colon) = compact.find(':') else {
        return true;
    };
    let scheme = &compact[..colon];
    if !is_scheme(scheme) {
        // "./a:b", "?x=y:z" and friends resolve as relative references.
        return true;
    }

    let scheme = scheme.to_ascii_lowercase();
    if scheme == "data" {
        let media = compact[colon + 1..].to_ascii_lowercase();
        return tag == "img" && attr == "src" && media.starts_with("image/");
    }
    config.is_uri_scheme_allowed(&scheme)
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
