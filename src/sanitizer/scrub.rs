//! Regex-driven scrubbing of dangerous substrings.
//!
//! Runs after the allow-list pass and only ever rewrites or removes text, so
//! it cannot introduce markup the tree pass would have rejected.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Sanitizer;

/// Literal every neutralized scheme prefix is rewritten to.
const NEUTRALIZED_SCHEME: &str = "removed:";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("scrub rule: hardcoded regex is valid")
}

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<script\b.*?</script\s*>"));
static SCRIPT_SCHEME: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)(?:java|vb)script:"));
static DATA_SCHEME: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)data:"));
static CSS_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)expression\s*\("));
static CSS_IMPORT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)@import"));
static CSS_BEHAVIOR: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)behavior\s*:"));
static MOZ_BINDING: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)-moz-binding"));
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bon\w+\s*="));
static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"(?i)\s?\bstyle\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});
static STYLE_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)expression|javascript|vbscript|data:|@import|behavior|-moz-binding")
});

/// How many times [`PatternScrubber`] applies its rule set per call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrubMode {
    /// Apply every rule exactly once.
    Once,
    /// Reapply the rule set until the output stops changing.
    #[default]
    FixedPoint,
}

/// Sanitizer that neutralizes script blocks, dangerous URL schemes, CSS
/// injection constructs and inline event handlers by string rewriting.
///
/// # Example
///
/// ```
/// use html_guard::{PatternScrubber, ScrubMode, Sanitizer};
///
/// let scrubber = PatternScrubber::new(ScrubMode::FixedPoint);
/// let out = scrubber.sanitize(r#"<a href="javascript:alert(1)">x</a>"#);
/// assert_eq!(out, r#"<a href="removed:alert(1)">x</a>"#);
/// ```
pub struct PatternScrubber {
    mode: ScrubMode,
}

impl PatternScrubber {
    pub fn new(mode: ScrubMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ScrubMode {
        self.mode
    }
}

impl Default for PatternScrubber {
    fn default() -> Self {
        Self::new(ScrubMode::default())
    }
}

impl Sanitizer for PatternScrubber {
    fn sanitize(&self, html: &str) -> String {
        match self.mode {
            ScrubMode::Once => scrub_once(html),
            ScrubMode::FixedPoint => scrub(html),
        }
    }
}

/// Apply the rewrite rules until the output no longer changes.
///
/// Every rule either shortens its match or writes a replacement no rule
/// matches, so the loop ends.
pub fn scrub(html: &str) -> String {
    let mut current = scrub_once(html);
    loop {
        let next = scrub_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Apply each rewrite rule once, in order.
///
/// Script blocks are removed until none are left, so a payload nested inside
/// itself cannot survive by losing one layer per call.
pub fn scrub_once(html: &str) -> String {
    let mut out = SCRIPT_BLOCK.replace_all(html, "").into_owned();
    while SCRIPT_BLOCK.is_match(&out) {
        out = SCRIPT_BLOCK.replace_all(&out, "").into_owned();
    }
    let out = SCRIPT_SCHEME.replace_all(&out, NEUTRALIZED_SCHEME).into_owned();
    let out = neutralize_data_uris(&out);
    let out = CSS_EXPRESSION.replace_all(&out, "removed(").into_owned();
    let out = CSS_IMPORT.replace_all(&out, "removed").into_owned();
    let out = CSS_BEHAVIOR.replace_all(&out, "removed:").into_owned();
    let out = MOZ_BINDING.replace_all(&out, "removed").into_owned();
    let out = EVENT_HANDLER.replace_all(&out, "data-removed=").into_owned();
    STYLE_ATTR
        .replace_all(&out, |caps: &Captures<'_>| {
            let value = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            if STYLE_TOKENS.is_match(value) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Rewrite `data:<media>[;,]` to the neutralized prefix unless the media type
/// is `image/*`.
fn neutralize_data_uris(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(m) = DATA_SCHEME.find_at(input, pos) {
        let after = &input[m.end()..];
        let is_image = after
            .get(..6)
            .is_some_and(|media| media.eq_ignore_ascii_case("image/"));
        if is_image {
            out.push_str(&input[pos..m.end()]);
            pos = m.end();
            continue;
        }

        let Some(delim) = after.find([';', ',']) else {
            break;
        };
        out.push_str(&input[pos..m.start()]);
        out.push_str(NEUTRALIZED_SCHEME);
        pos = m.end() + delim + 1;
    }

    out.push_str(&input[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_blocks() {
        assert_eq!(scrub_once("<p>a<script>x()</script>b</p>"), "<p>ab</p>");
        assert_eq!(
            scrub_once("<p>a<SCRIPT type=\"t\">\nx()\n</SCRIPT >b</p>"),
            "<p>ab</p>"
        );
    }

    #[test]
    fn neutralizes_script_schemes() {
        assert_eq!(
            scrub_once(r#"<a href="javascript:alert(1)">x</a>"#),
            r#"<a href="removed:alert(1)">x</a>"#
        );
        assert_eq!(
            scrub_once(r#"<a href="VBScript:msgbox(1)">x</a>"#),
            r#"<a href="removed:msgbox(1)">x</a>"#
        );
    }

    #[test]
    fn keeps_image_data_uris() {
        let html = r#"<img src="data:image/png;base64,AAAA">"#;
        assert_eq!(scrub_once(html), html);
        let upper = r#"<img src="DATA:IMAGE/png;base64,AAAA">"#;
        assert_eq!(scrub_once(upper), upper);
    }

    #[test]
    fn neutralizes_other_data_uris() {
        assert_eq!(
            scrub_once(r#"<a href="data:text/html;base64,AAAA">x</a>"#),
            r#"<a href="removed:base64,AAAA">x</a>"#
        );
        assert_eq!(
            scrub_once("data:image/png;x data:application/x,y"),
            "data:image/png;x removed:y"
        );
    }

    #[test]
    fn data_without_delimiter_is_left_alone() {
        assert_eq!(scrub_once("metadata: none"), "metadata: none");
    }

    #[test]
    fn neutralizes_css_constructs() {
        assert_eq!(
            scrub_once("width: Expression (alert(1))"),
            "width: removed(alert(1))"
        );
        assert_eq!(scrub_once("@IMPORT url(x.css)"), "removed url(x.css)");
        assert_eq!(scrub_once("behavior : url(x.htc)"), "removed: url(x.htc)");
        assert_eq!(scrub_once("-moz-binding:url(x)"), "removed:url(x)");
    }

    #[test]
    fn rewrites_event_handler_names() {
        assert_eq!(
            scrub_once("<img src=x onerror=alert(1)>"),
            "<img src=x data-removed=alert(1)>"
        );
        assert_eq!(
            scrub_once(r#"<div OnMouseOver = "x()">a</div>"#),
            r#"<div data-removed= "x()">a</div>"#
        );
    }

    #[test]
    fn strips_dangerous_style_attributes() {
        assert_eq!(
            scrub_once(r#"<p style="background: url(data:image/png;base64,AA)">x</p>"#),
            "<p>x</p>"
        );
        assert_eq!(
            scrub_once(r#"<p style='x: expression'>x</p>"#),
            "<p>x</p>"
        );
        assert_eq!(
            scrub_once(r#"<p style="color: red">x</p>"#),
            r#"<p style="color: red">x</p>"#
        );
    }

    #[test]
    fn clean_input_is_untouched() {
        let html = r#"<h1>Title</h1><p class="lead">Some <em>text</em> on one line.</p>"#;
        assert_eq!(scrub(html), html);
        assert_eq!(scrub_once(html), html);
    }

    #[test]
    fn fixed_point_catches_joined_payloads() {
        let html = r#"javas style="a:expression"cript:alert(1)"#;
        let once = scrub_once(html);
        assert_eq!(once, "javascript:alert(1)");
        assert_eq!(scrub(html), "removed:alert(1)");
    }

    #[test]
    fn scrub_is_idempotent() {
        for html in [
            r#"<a href="javascript:alert(1)">x</a>"#,
            r#"<img src="data:text/html;base64,AAAA" onload=x()>"#,
            r#"<p style="x:expression(1)">y</p>"#,
            "<scr<script>x</script>ipt>alert(1)</script>",
            "javajavascript:script:alert(1)",
            "data:data:text/html,,x",
            r#"javas style="a:expression"cript:alert(1)"#,
        ] {
            let once = scrub(html);
            assert_eq!(scrub(&once), once, "not idempotent for {html}");
        }
    }

    #[test]
    fn nested_script_blocks_are_removed_in_one_pass() {
        let mut html = String::from("<script>y</script>");
        for depth in 1..=32 {
            html = format!("<scr{html}ipt>y</script>");
            assert_eq!(scrub_once(&html), "", "depth {depth}");
            assert_eq!(scrub(&html), "", "depth {depth}");
        }
    }

    #[test]
    fn scrubber_modes() {
        assert_eq!(PatternScrubber::default().mode(), ScrubMode::FixedPoint);
        let once = PatternScrubber::new(ScrubMode::Once);
        assert_eq!(
            once.sanitize(r#"javas style="a:expression"cript:1"#),
            "javascript:1"
        );
    }
}
