//! Completion service abstraction
//!
//! Provides a common interface for the remote text-completion endpoint.

mod endpoint;
mod error;
mod types;

pub use endpoint::{EndpointConfig, EndpointService, DEFAULT_ANSWER_FIELD};
pub use error::LlmError;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion providers
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete a prompt, given the prior turns
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Where requests go, for logging
    fn endpoint(&self) -> &str;
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
    endpoint: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        let endpoint = inner.endpoint().to_string();
        Self { inner, endpoint }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    prompt_chars = request.prompt.len(),
                    history_turns = request.history.len(),
                    answer_chars = text.len(),
                    "Completion request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Completion request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
