//! Mock implementations for testing
//!
//! These mocks enable session tests without real I/O.

use crate::diagram::{DiagramRenderer, DiagramSource, RenderError};
use crate::llm::{CompletionRequest, CompletionService, LlmError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Completion Service
// ============================================================================

/// Mock completion service that returns queued answers
pub struct MockCompletionService {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful answer
    pub fn queue_response(&self, answer: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(answer.into()));
    }

    /// Queue an error
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<String, LlmError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

impl Default for MockCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }

    fn endpoint(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Delayed Mock Completion Service (for reset and timeout testing)
// ============================================================================

/// Mock completion service that answers only after a delay
pub struct DelayedMockCompletionService {
    inner: MockCompletionService,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockCompletionService {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockCompletionService::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, answer: impl Into<String>) {
        self.inner.queue_response(answer);
    }
}

#[async_trait]
impl CompletionService for DelayedMockCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        // notify_one keeps a permit if the test has not started waiting yet
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next_response()
    }

    fn endpoint(&self) -> &str {
        "mock-delayed"
    }
}

// ============================================================================
// Mock Renderer
// ============================================================================

/// Mock renderer returning fixed image bytes unless an error is queued
pub struct MockRenderer {
    image: Vec<u8>,
    errors: Mutex<VecDeque<RenderError>>,
    /// Record of every source rendered
    pub sources: Mutex<Vec<String>>,
}

impl MockRenderer {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            errors: Mutex::new(VecDeque::new()),
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Make the next render fail
    pub fn queue_error(&self, error: RenderError) {
        self.errors.lock().unwrap().push_back(error);
    }

    pub fn recorded_sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiagramRenderer for MockRenderer {
    async fn render(&self, source: &DiagramSource) -> Result<Vec<u8>, RenderError> {
        self.sources.lock().unwrap().push(source.as_str().to_string());
        match self.errors.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(self.image.clone()),
        }
    }
}
