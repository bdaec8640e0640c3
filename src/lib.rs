//! # html_guard
//!
//! A layered HTML sanitization core for rich-text editors, plus the link and
//! image admission checks an editor's insertion features need.
//!
//! ## Overview
//!
//! Each time editor content changes, `html_guard` runs three components:
//!
//! 1. [`ThreatDetector`] scans the raw HTML and reports suspicious pattern
//!    categories for logging. It never changes the output.
//! 2. [`AllowListSanitizer`] parses the HTML and rebuilds it from allow-listed
//!    tags and attributes only, unwrapping unknown elements and deleting
//!    forbidden ones.
//! 3. [`PatternScrubber`] rewrites dangerous substrings (script blocks, script
//!    and non-image data URL schemes, CSS injection constructs, event handler
//!    names) that might survive the tree pass.
//!
//! A [`ContentGuard`] owns all three. [`LinkPolicy`] decides which URLs may
//! become links or be auto-linked, and [`Assistant`] feeds AI-generated
//! content back through the same guard before inserting it.
//!
//! ## Quick start
//!
//! ```rust
//! use html_guard::{ContentGuardBuilder, LinkContext};
//!
//! let guard = ContentGuardBuilder::new().build();
//!
//! let safe = guard.process(r#"<p onclick="steal()">Hello<script>x()</script></p>"#);
//! assert_eq!(safe, "<p>Hello</p>");
//!
//! let ctx = LinkContext::default();
//! assert!(guard.is_allowed_uri("example.com/docs", &ctx));
//! assert!(!guard.is_allowed_uri("file:///etc/passwd", &ctx));
//! ```

pub mod assist;
pub mod config;
pub mod detect;
pub mod editor;
pub mod error;
pub mod guard;
pub mod link;
pub mod media;
pub mod sanitizer;

pub use assist::{AssistOutcome, Assistant, ContentGenerator};
pub use config::{ContentGuardBuilder, SanitizationConfig};
pub use detect::{ThreatDetector, ThreatPattern, ThreatReport, detect};
pub use editor::EditorSurface;
pub use error::{GuardError, Result};
pub use guard::ContentGuard;
pub use link::{LinkContext, LinkPolicy, default_validate, is_allowed_uri, should_auto_link};
pub use media::admit_image_data_url;
pub use sanitizer::{
    AllowListSanitizer, PatternScrubber, Sanitizer, SanitizerPipeline, ScrubMode, sanitize, scrub,
    scrub_once,
};

use std::sync::OnceLock;

static GLOBAL: OnceLock<ContentGuard> = OnceLock::new();

/// Build and register the process-wide [`ContentGuard`].
///
/// Call once at application startup; afterwards any part of the application
/// can reach the guard through [`global()`]. A second call leaves the first
/// guard in place and returns [`GuardError::AlreadyInitialized`].
pub fn init(builder: ContentGuardBuilder) -> Result<&'static ContentGuard> {
    let mut fresh = false;
    let guard = GLOBAL.get_or_init(|| {
        fresh = true;
        builder.build()
    });
    if fresh {
        Ok(guard)
    } else {
        Err(GuardError::AlreadyInitialized)
    }
}

/// Retrieve the guard previously registered with [`init()`].
pub fn global() -> Option<&'static ContentGuard> {
    GLOBAL.get()
}
