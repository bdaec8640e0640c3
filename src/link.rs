//! Admission policy for explicit links and auto-detected links.
//!
//! Both predicates are total: a candidate that cannot be parsed is rejected,
//! never reported as an error.

use std::sync::LazyLock;

use url::Url;

use crate::config::{
    DEFAULT_LINK_PROTOCOLS, DEFAULT_PROTOCOL, DENIED_AUTOLINK_DOMAINS, DENIED_LINK_DOMAINS,
    DENIED_LINK_SCHEMES,
};

/// Schemes the baseline validator accepts in addition to a context's own.
const BASELINE_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "ftps", "mailto", "tel", "callto", "sms", "cid", "xmpp",
];

static DEFAULT_POLICY: LazyLock<LinkPolicy> = LazyLock::new(LinkPolicy::default);

/// Signature of a context's baseline URI check: `(href, context protocols)`.
pub type UriValidator = fn(&str, &[String]) -> bool;

/// What the editor's link feature knows when it asks for admission.
#[derive(Clone, Debug)]
pub struct LinkContext {
    /// Scheme assumed for candidates without one.
    pub default_protocol: String,
    /// Schemes this editor accepts.
    pub protocols: Vec<String>,
    /// Baseline check applied before any policy list.
    pub validator: UriValidator,
}

impl LinkContext {
    pub fn new<I, T>(default_protocol: impl Into<String>, protocols: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            default_protocol: default_protocol.into(),
            protocols: protocols.into_iter().map(Into::into).collect(),
            validator: default_validate,
        }
    }

    pub fn with_validator(mut self, validator: UriValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn validate(&self, href: &str) -> bool {
        (self.validator)(href, &self.protocols)
    }
}

impl Default for LinkContext {
    fn default() -> Self {
        Self::new(DEFAULT_PROTOCOL, DEFAULT_LINK_PROTOCOLS.iter().copied())
    }
}

/// Baseline URI check used by [`LinkContext::default`].
///
/// Whitespace is ignored. Relative references pass; absolute ones must use a
/// baseline scheme or one of `protocols`.
pub fn default_validate(href: &str, protocols: &[String]) -> bool {
    let cleaned: String = href
        .chars()
        .filter(|&c| !is_attr_whitespace(c))
        .collect();
    if cleaned.is_empty() {
        return false;
    }

    let Some((scheme, _)) = cleaned.split_once(':') else {
        return true;
    };
    if !is_scheme(scheme) {
        return true;
    }
    BASELINE_SCHEMES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(scheme))
        || protocols.iter().any(|p| p.eq_ignore_ascii_case(scheme))
}

fn is_attr_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{20}'
            | '\u{a0}'
            | '\u{1680}'
            | '\u{180e}'
            | '\u{2000}'..='\u{2029}'
            | '\u{205f}'
            | '\u{3000}'
    )
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Parse a candidate, prefixing `default_protocol://` when it has no `:`.
fn parse_candidate(candidate: &str, default_protocol: &str) -> Option<Url> {
    let parsed = if candidate.contains(':') {
        Url::parse(candidate)
    } else {
        Url::parse(&format!("{default_protocol}://{candidate}"))
    };
    parsed.ok()
}

/// Scheme and domain deny-lists for link admission.
///
/// Explicit links and auto-links use separate domain lists.
///
/// # Example
///
/// ```
/// use html_guard::{LinkContext, LinkPolicy};
///
/// let policy = LinkPolicy::default().deny_domains(["tracker.example"]);
/// let ctx = LinkContext::default();
/// assert!(policy.is_allowed_uri("https://example.com/x", &ctx));
/// assert!(!policy.is_allowed_uri("https://tracker.example/x", &ctx));
/// assert!(!policy.is_allowed_uri("file:///etc/passwd", &ctx));
/// ```
#[derive(Clone, Debug)]
pub struct LinkPolicy {
    denied_schemes: Vec<String>,
    denied_domains: Vec<String>,
    denied_autolink_domains: Vec<String>,
}

impl LinkPolicy {
    /// A policy with no deny-lists at all.
    pub fn permissive() -> Self {
        Self {
            denied_schemes: Vec::new(),
            denied_domains: Vec::new(),
            denied_autolink_domains: Vec::new(),
        }
    }

    pub fn deny_schemes<I, T>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.denied_schemes
            .extend(schemes.into_iter().map(|s| s.as_ref().to_ascii_lowercase()));
        self
    }

    /// Hosts refused as explicit links.
    pub fn deny_domains<I, T>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.denied_domains
            .extend(domains.into_iter().map(|d| d.as_ref().to_ascii_lowercase()));
        self
    }

    /// Hosts never auto-linked.
    pub fn deny_autolink_domains<I, T>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.denied_autolink_domains
            .extend(domains.into_iter().map(|d| d.as_ref().to_ascii_lowercase()));
        self
    }

    /// Whether `candidate` may be turned into a link.
    ///
    /// Checks, in order: parse, the context's baseline validator, the scheme
    /// deny-list, the context's protocol allow-list, the domain deny-list.
    pub fn is_allowed_uri(&self, candidate: &str, ctx: &LinkContext) -> bool {
        let Some(url) = parse_candidate(candidate, &ctx.default_protocol) else {
            tracing::debug!("Link rejected, unparseable: {candidate}");
            return false;
        };

        if !ctx.validate(url.as_str()) {
            tracing::debug!("Link rejected by baseline validator: {url}");
            return false;
        }

        let scheme = url.scheme();
        if self.denied_schemes.iter().any(|s| s == scheme) {
            tracing::debug!("Link rejected, denied scheme {scheme}: {url}");
            return false;
        }
        if !ctx.protocols.iter().any(|p| p.eq_ignore_ascii_case(scheme)) {
            tracing::debug!("Link rejected, scheme {scheme} not enabled: {url}");
            return false;
        }

        if url
            .host_str()
            .is_some_and(|host| self.denied_domains.iter().any(|d| d == host))
        {
            tracing::debug!("Link rejected, denied domain: {url}");
            return false;
        }

        true
    }

    /// Whether `candidate` may be linked without explicit user action.
    pub fn should_auto_link(&self, candidate: &str) -> bool {
        let Some(url) = parse_candidate(candidate, DEFAULT_PROTOCOL) else {
            return false;
        };
        !url
            .host_str()
            .is_some_and(|host| self.denied_autolink_domains.iter().any(|d| d == host))
    }
}

impl Default for LinkPolicy {
    /// The policy built from the `DENIED_*` constants.
    fn default() -> Self {
        Self::permissive()
            .deny_schemes(DENIED_LINK_SCHEMES)
            .deny_domains(DENIED_LINK_DOMAINS)
            .deny_autolink_domains(DENIED_AUTOLINK_DOMAINS)
    }
}

/// [`LinkPolicy::is_allowed_uri`] with the default policy.
pub fn is_allowed_uri(candidate: &str, ctx: &LinkContext) -> bool {
    DEFAULT_POLICY.is_allowed_uri(candidate, ctx)
}

/// [`LinkPolicy::should_auto_link`] with the default policy.
pub fn should_auto_link(candidate: &str) -> bool {
    DEFAULT_POLICY.should_auto_link(candidate)
}
