//! AI analysis.
//!
//! An [`AnalysisProvider`] turns a [`PromptRequest`] into narrative text.
//! [`analyze`] wraps a provider call with the configured [`RetryPolicy`] and
//! the empty-response fallback, so callers only ever see usable text or an
//! error.

mod gemini;
mod retry;

pub use gemini::GeminiProvider;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::prompt::{finish_response, PromptRequest};

/// A backend that can answer analysis prompts.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Send one request and return the raw response text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AiRequest`](crate::Error::AiRequest) or
    /// [`Error::Timeout`](crate::Error::Timeout) when the call fails.
    async fn generate(&self, request: &PromptRequest) -> Result<String>;
}

/// Run `request` against `provider`, retrying per `policy`.
///
/// Empty responses become [`EMPTY_RESPONSE_FALLBACK`](crate::prompt::EMPTY_RESPONSE_FALLBACK).
///
/// # Errors
///
/// Returns the provider's last error once the policy gives up.
pub async fn analyze(
    provider: &dyn AnalysisProvider,
    request: &PromptRequest,
    policy: &RetryPolicy,
) -> Result<String> {
    match policy.run(|| provider.generate(request)).await {
        Ok(text) => {
            info!(chars = text.len(), "Analysis complete");
            Ok(finish_response(text))
        }
        Err(err) => {
            warn!(error = %err, "Analysis failed");
            Err(err)
        }
    }
}
