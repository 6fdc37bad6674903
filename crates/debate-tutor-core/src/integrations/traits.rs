use std::future::Future;

use crate::error::Result;

/// A text-generation service that turns a prompt into free text.
///
/// Implementations report transport failures and non-success responses as
/// [`CoreError::Upstream`](crate::error::CoreError::Upstream). No retry is
/// performed; the caller decides what to do with a failure.
pub trait TextGenerator: Send + Sync {
    /// Unique identifier (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send `prompt`, optionally preceded by a system instruction, and return
    /// the reply text.
    fn send(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;
}
