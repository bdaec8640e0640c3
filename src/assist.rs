//! AI-assisted content insertion.
//!
//! The generator itself is supplied by the embedding application; this
//! module only bounds the request in time, lets the caller cancel it, and
//! makes sure whatever comes back is treated as untrusted input.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time;

use crate::editor::EditorSurface;
use crate::error::{GuardError, Result};
use crate::guard::ContentGuard;

/// Inserted instead of a request when assistance is switched off.
pub const DISABLED_NOTICE: &str = "AI feature not enabled. Configure your API key";

/// Inserted when the generator fails, times out or answers with nothing.
pub const NO_RESPONSE_NOTICE: &str = "No response Received";

/// Appended to every question before it is sent to the generator.
pub const PROMPT_SUFFIX: &str = ".Give answer in formatted html code when needed";

/// Deadline for one generation request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for backends that turn a prompt into (untrusted) HTML.
///
/// # Implementing a custom generator
///
/// ```rust,no_run
/// use html_guard::{ContentGenerator, Result};
///
/// struct Canned;
///
/// impl ContentGenerator for Canned {
///     async fn generate(&self, prompt: &str) -> Result<String> {
///         Ok(format!("<p>You asked: {prompt}</p>"))
///     }
/// }
/// ```
pub trait ContentGenerator: Send + Sync + 'static {
    /// Produce a response for `prompt`.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// How one [`Assistant::generate_into`] call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssistOutcome {
    /// Sanitized generator output was inserted.
    Inserted,
    /// [`NO_RESPONSE_NOTICE`] was inserted.
    NoResponse,
    /// [`DISABLED_NOTICE`] was inserted.
    Disabled,
    /// Another request was still in flight; nothing happened.
    Busy,
    /// The caller cancelled; nothing was inserted.
    Cancelled,
}

/// Clears the in-flight flag however the request ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs generation requests for an editor, one at a time.
pub struct Assistant<G: ContentGenerator> {
    generator: G,
    enabled: bool,
    timeout: Duration,
    in_flight: AtomicBool,
}

impl<G: ContentGenerator> Assistant<G> {
    /// An enabled assistant with the [`DEFAULT_TIMEOUT`].
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            enabled: true,
            timeout: DEFAULT_TIMEOUT,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Ask the generator about `question` and insert the sanitized answer.
    ///
    /// Sending on the `cancel` channel abandons the request; dropping its
    /// sender does not.
    pub async fn generate_into<E>(
        &self,
        guard: &ContentGuard,
        editor: &mut E,
        question: &str,
        mut cancel: oneshot::Receiver<()>,
    ) -> AssistOutcome
    where
        E: EditorSurface + Send + ?Sized,
    {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return AssistOutcome::Busy;
        }
        let _in_flight = InFlight(&self.in_flight);

        if !self.enabled {
            editor.insert_content(DISABLED_NOTICE);
            return AssistOutcome::Disabled;
        }

        let prompt = format!("{question}{PROMPT_SUFFIX}");
        let response = tokio::select! {
            biased;

            Ok(()) = &mut cancel => {
                tracing::info!("Generation request cancelled");
                return AssistOutcome::Cancelled;
            }

            result = self.request(&prompt) => result,
        };

        match response {
            Ok(text) if guard.insert_untrusted(editor, &text) => AssistOutcome::Inserted,
            Ok(_) => {
                editor.insert_content(NO_RESPONSE_NOTICE);
                AssistOutcome::NoResponse
            }
            Err(e) => {
                tracing::error!("Generation request failed: {e}");
                editor.insert_content(NO_RESPONSE_NOTICE);
                AssistOutcome::NoResponse
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        time::timeout(self.timeout, self.generator.generate(prompt))
            .await
            .map_err(|_| GuardError::Timeout(self.timeout))?
    }
}
