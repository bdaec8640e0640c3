//! The [`ContentGuard`] that ties detection, sanitization and link admission
//! together for an editor.

use crate::detect::{ThreatDetector, ThreatReport};
use crate::editor::EditorSurface;
use crate::link::{LinkContext, LinkPolicy};
use crate::sanitizer::SanitizerPipeline;

/// Primary handle returned by [`ContentGuardBuilder::build`](crate::ContentGuardBuilder::build).
///
/// Owns the sanitization pipeline (allow-list pass, then pattern scrubber),
/// the threat detector and the link policy. Every method is a pure function of
/// its input and the guard's fixed configuration, so one guard can serve any
/// number of editors.
pub struct ContentGuard {
    pipeline: SanitizerPipeline,
    detector: ThreatDetector,
    link_policy: LinkPolicy,
}

impl ContentGuard {
    pub(crate) fn new(
        pipeline: SanitizerPipeline,
        detector: ThreatDetector,
        link_policy: LinkPolicy,
    ) -> Self {
        Self {
            pipeline,
            detector,
            link_policy,
        }
    }

    /// Run `raw` through the full pipeline.
    ///
    /// A missing or empty input yields an empty string.
    pub fn sanitize<'a>(&self, raw: impl Into<Option<&'a str>>) -> String {
        match raw.into() {
            Some(html) if !html.is_empty() => self.pipeline.sanitize(html),
            _ => String::new(),
        }
    }

    /// Scan raw input for threat categories without touching it.
    pub fn detect(&self, raw: &str) -> ThreatReport {
        self.detector.detect(raw)
    }

    /// Detect, log any findings, then sanitize.
    ///
    /// The report is advisory: the returned HTML is exactly what
    /// [`sanitize`](Self::sanitize) would return.
    pub fn process(&self, raw: &str) -> String {
        let report = self.detect(raw);
        if !report.is_clean() {
            tracing::warn!("Malicious patterns detected: {:?}", report.categories());
        }
        let sanitized = self.sanitize(raw);
        tracing::debug!(
            "Processed {} bytes of editor content into {} bytes",
            raw.len(),
            sanitized.len()
        );
        sanitized
    }

    /// Handle a content-changed event: serialize the editor and return the
    /// HTML that is safe to hand to the page.
    pub fn on_content_changed<E: EditorSurface + ?Sized>(&self, editor: &E) -> String {
        self.process(&editor.html())
    }

    /// Sanitize untrusted content and insert whatever survives.
    ///
    /// Returns `false` when nothing survived and nothing was inserted.
    pub fn insert_untrusted<E: EditorSurface + ?Sized>(&self, editor: &mut E, html: &str) -> bool {
        let safe = self.process(html);
        if safe.trim().is_empty() {
            return false;
        }
        editor.insert_content(&safe);
        true
    }

    /// Whether `candidate` may become an explicit link in `ctx`.
    pub fn is_allowed_uri(&self, candidate: &str, ctx: &LinkContext) -> bool {
        self.link_policy.is_allowed_uri(candidate, ctx)
    }

    /// Whether `candidate` may be auto-linked.
    pub fn should_auto_link(&self, candidate: &str) -> bool {
        self.link_policy.should_auto_link(candidate)
    }

    pub fn detector(&self) -> &ThreatDetector {
        &self.detector
    }

    pub fn link_policy(&self) -> &LinkPolicy {
        &self.link_policy
    }
}

impl Default for ContentGuard {
    fn default() -> Self {
        crate::config::ContentGuardBuilder::new().build()
    }
}
