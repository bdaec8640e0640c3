//! Error types for the `html_guard` crate.
//!
//! The sanitization core never fails; these errors only surface at the
//! configuration and content-generation seams.

use std::time::Duration;

/// All errors that can occur outside the infallible sanitization core.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// A content generator failed to produce a response.
    #[error("Content generation failed: {0}")]
    Generation(Box<dyn std::error::Error + Send + Sync>),

    /// A content generator did not answer before its deadline.
    #[error("Content generation timed out after {0:?}")]
    Timeout(Duration),

    /// A user-supplied detection or scrub pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The process-wide guard was registered more than once.
    #[error("Global ContentGuard already initialized")]
    AlreadyInitialized,
}

/// A type alias for `Result<T, GuardError>`.
pub type Result<T> = std::result::Result<T, GuardError>;
