//! HTML sanitization stages and the pipeline that chains them.
//!
//! Stages implement the [`Sanitizer`] trait and are composed into a
//! [`SanitizerPipeline`] that runs them sequentially.
//!
//! Built-in stages:
//!
//! - [`AllowListSanitizer`] -- tree-based allow-list rebuild of the markup.
//! - [`PatternScrubber`] -- regex rewrites that neutralize dangerous
//!   substrings left behind by parser quirks.

mod allowlist;
mod scrub;
mod serialize;

pub use allowlist::{AllowListSanitizer, sanitize};
pub use scrub::{PatternScrubber, ScrubMode, scrub, scrub_once};

/// Trait for HTML sanitization stages.
///
/// Each stage receives an HTML string and returns a transformed version. A
/// stage never fails: anything it cannot make sense of is dropped or passed
/// through as text. Implementations must be `Send + Sync` so a guard can be
/// shared across threads.
pub trait Sanitizer: Send + Sync {
    /// Transform the given HTML content, returning the sanitized result.
    fn sanitize(&self, html: &str) -> String;
}

/// An ordered chain of [`Sanitizer`] implementations applied sequentially.
///
/// Each stage receives the output of the previous one. An empty pipeline
/// is a no-op.
pub struct SanitizerPipeline {
    stages: Vec<Box<dyn Sanitizer>>,
}

impl SanitizerPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage to the end of the pipeline.
    pub fn add(&mut self, stage: impl Sanitizer + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Run the full pipeline on the given HTML, returning the final result.
    pub fn sanitize(&self, html: &str) -> String {
        self.stages
            .iter()
            .fold(html.to_string(), |acc, s| s.sanitize(&acc))
    }

    /// Returns `true` if no stages have been added.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }
}

impl Default for SanitizerPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SanitizationConfig;

    fn default_pipeline() -> SanitizerPipeline {
        let mut pipeline = SanitizerPipeline::new();
        pipeline.add(AllowListSanitizer::new(SanitizationConfig::default()));
        pipeline.add(PatternScrubber::new(ScrubMode::FixedPoint));
        pipeline
    }

    /// Rewrites one word, so its position in the chain is observable.
    struct Shout;

    impl Sanitizer for Shout {
        fn sanitize(&self, html: &str) -> String {
            html.replace("hello", "HELLO")
        }
    }

    #[test]
    fn custom_stage_sees_sanitized_markup() {
        let mut pipeline = default_pipeline();
        pipeline.add(Shout);
        assert_eq!(
            pipeline.sanitize("<p onclick=\"x()\">hello<script>hello()</script></p>"),
            "<p>HELLO</p>"
        );
    }

    #[test]
    fn pipeline_output_is_stable() {
        let pipeline = default_pipeline();
        for html in [
            "<p>a <bogus>b</bogus> javascript:c</p>",
            "<pre><!--x-->\ncode</pre>",
            r#"<img src="data:text/html;base64,AA" alt="onload=1">"#,
        ] {
            let once = pipeline.sanitize(html);
            assert_eq!(pipeline.sanitize(&once), once, "input {html}");
        }
    }

    #[test]
    fn pipeline_chains_stages_in_order() {
        let mut pipeline = SanitizerPipeline::new();
        pipeline.add(AllowListSanitizer::new(SanitizationConfig::default()));
        pipeline.add(PatternScrubber::new(ScrubMode::FixedPoint));
        assert_eq!(pipeline.len(), 2);

        let html = concat!(
            r#"<div><script>steal()</script><p style="width: expression(alert(1))">"#,
            r#"Hi <bogus>there</bogus></p><a href="https://example.com" onclick="x()">ok</a></div>"#,
        );
        let result = pipeline.sanitize(html);

        assert!(!result.contains("<script"));
        assert!(!result.contains("steal"));
        assert!(!result.contains("expression"));
        assert!(!result.contains("onclick"));
        assert!(!result.contains("bogus"));
        assert!(result.contains("Hi there"));
        assert!(result.contains(r#"<a href="https://example.com">ok</a>"#));
    }

    #[test]
    fn scrubber_sees_allowlist_output() {
        // Plain-text prose that looks like a scheme survives the tree pass
        // and is neutralized by the scrubber.
        let mut pipeline = SanitizerPipeline::new();
        pipeline.add(AllowListSanitizer::new(SanitizationConfig::default()));
        pipeline.add(PatternScrubber::new(ScrubMode::Once));

        let result = pipeline.sanitize("<p>try javascript:alert(1)</p>");
        assert_eq!(result, "<p>try removed:alert(1)</p>");
    }
}
