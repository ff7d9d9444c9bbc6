//! Server configuration from the environment

use crate::diagram::{AcceptancePolicy, DEFAULT_SERVER_URL};
use crate::llm::{EndpointConfig, DEFAULT_ANSWER_FIELD};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 7860;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;
const DEFAULT_FLAGGING_DIR: &str = "flagged";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    /// PlantUML server base URL, ending in the image format path
    pub plantuml_server: String,
    pub port: u16,
    /// Upper bound for any single outbound request
    pub request_timeout: Duration,
    pub policy: AcceptancePolicy,
    /// Sessions untouched for this long are dropped
    pub session_idle_timeout: Duration,
    /// Directory holding the flagged-exchange log
    pub flagging_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = parse_or(get("WEBSITE_PORT"), "WEBSITE_PORT", DEFAULT_PORT);
        let timeout_secs = parse_or(
            get("REQUEST_TIMEOUT_SECS"),
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        );
        let request_timeout = Duration::from_secs(timeout_secs.max(1));

        let idle_secs = parse_or(
            get("SESSION_IDLE_TIMEOUT_SECS"),
            "SESSION_IDLE_TIMEOUT_SECS",
            DEFAULT_SESSION_IDLE_SECS,
        );

        let policy = get("DIAGRAM_KEYWORDS")
            .map(|list| AcceptancePolicy::with_keyword_list(&list))
            .unwrap_or_default();

        Self {
            endpoint: EndpointConfig {
                url: get("COMPLETION_ENDPOINT"),
                api_key: get("COMPLETION_API_KEY"),
                answer_field: get("COMPLETION_ANSWER_FIELD")
                    .unwrap_or_else(|| DEFAULT_ANSWER_FIELD.to_string()),
                timeout: request_timeout,
            },
            plantuml_server: get("PLANTUML_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            port,
            request_timeout,
            policy,
            session_idle_timeout: Duration::from_secs(idle_secs.max(1)),
            flagging_dir: PathBuf::from(
                get("FLAGGING_DIR").unwrap_or_else(|| DEFAULT_FLAGGING_DIR.to_string()),
            ),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable setting");
            default
        }),
        None => default,
    }
}
