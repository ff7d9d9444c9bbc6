//! Completion error types

use thiserror::Error;

/// Completion error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedResponse, message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::NotConfigured, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP status from the completion endpoint
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::auth(format!("Authentication failed: {body}")),
            429 => Self::rate_limit(format!("Rate limited: {body}")),
            400 => Self::invalid_request(format!("Invalid request: {body}")),
            500..=599 => Self::server_error(format!("Server error ({status}): {body}")),
            _ => Self::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

/// Error classification, used for logging and status text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection failures and timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// Body could not be read or was not JSON
    MalformedResponse,
    /// No endpoint URL configured
    NotConfigured,
    /// Unknown error
    Unknown,
}

impl LlmErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::MalformedResponse => "malformed_response",
            Self::NotConfigured => "not_configured",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            LlmError::from_status(StatusCode::UNAUTHORIZED, "").kind,
            LlmErrorKind::Auth
        );
        assert_eq!(
            LlmError::from_status(StatusCode::FORBIDDEN, "").kind,
            LlmErrorKind::Auth
        );
        assert_eq!(
            LlmError::from_status(StatusCode::TOO_MANY_REQUESTS, "").kind,
            LlmErrorKind::RateLimit
        );
        assert_eq!(
            LlmError::from_status(StatusCode::BAD_REQUEST, "").kind,
            LlmErrorKind::InvalidRequest
        );
        assert_eq!(
            LlmError::from_status(StatusCode::BAD_GATEWAY, "").kind,
            LlmErrorKind::ServerError
        );
        assert_eq!(
            LlmError::from_status(StatusCode::NOT_FOUND, "").kind,
            LlmErrorKind::Unknown
        );
    }

    #[test]
    fn test_message_keeps_body() {
        let err = LlmError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "deployment offline");
        assert!(err.to_string().contains("deployment offline"));
    }
}
