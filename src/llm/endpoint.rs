//! Hosted completion endpoint implementation
//!
//! Talks to a deployed chat flow that takes `chat_input` plus a list of
//! prior question/answer exchanges and replies with a single JSON field.

use super::types::{ChatHistory, CompletionRequest};
use super::{CompletionService, LlmError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Returned in place of an answer when the response lacks the answer field
pub const NO_ANSWER: &str = "No answer received.";

/// Field the endpoint puts its completion text in, unless configured otherwise
pub const DEFAULT_ANSWER_FIELD: &str = "chat_output";

/// Connection settings for the completion endpoint
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub answer_field: String,
    pub timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            answer_field: DEFAULT_ANSWER_FIELD.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Completion service backed by the hosted endpoint
pub struct EndpointService {
    client: Client,
    url: Option<String>,
    api_key: String,
    answer_field: String,
}

impl EndpointService {
    pub fn new(config: &EndpointConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            answer_field: config.answer_field.clone(),
        })
    }

    fn translate_request(request: &CompletionRequest) -> EndpointRequest<'_> {
        EndpointRequest {
            chat_input: &request.prompt,
            chat_history: translate_history(&request.history),
        }
    }

    fn extract_answer(&self, body: &Value) -> String {
        body.get(&self.answer_field)
            .and_then(Value::as_str)
            .map_or_else(|| NO_ANSWER.to_string(), str::to_string)
    }
}

fn translate_history(history: &ChatHistory) -> Vec<EndpointExchange> {
    history
        .exchanges()
        .into_iter()
        .map(|(question, answer)| EndpointExchange {
            inputs: EndpointInputs { question },
            outputs: EndpointOutputs { answer },
        })
        .collect()
}

#[async_trait]
impl CompletionService for EndpointService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| LlmError::not_configured("No completion endpoint configured"))?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(ACCEPT, "application/json")
            .json(&Self::translate_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::malformed_response(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status, &body));
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            LlmError::malformed_response(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Ok(self.extract_answer(&parsed))
    }

    fn endpoint(&self) -> &str {
        self.url.as_deref().unwrap_or("<unset>")
    }
}

// Endpoint wire types

#[derive(Debug, Serialize)]
struct EndpointRequest<'a> {
    chat_input: &'a str,
    chat_history: Vec<EndpointExchange>,
}

#[derive(Debug, Serialize)]
struct EndpointExchange {
    inputs: EndpointInputs,
    outputs: EndpointOutputs,
}

#[derive(Debug, Serialize)]
struct EndpointInputs {
    question: String,
}

#[derive(Debug, Serialize)]
struct EndpointOutputs {
    answer: String,
}
