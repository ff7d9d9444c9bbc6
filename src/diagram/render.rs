//! Diagram rendering through a PlantUML server

use super::encoding::encode_plantuml;
use super::DiagramSource;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Public PlantUML server, PNG output
pub const DEFAULT_SERVER_URL: &str = "https://www.plantuml.com/plantuml/png/";

/// Why an image could not be produced
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("could not encode diagram source: {0}")]
    Encoding(String),
    #[error("rendering service returned HTTP {status}")]
    Status { status: u16 },
    #[error("rendering service unreachable: {0}")]
    Transport(String),
}

/// Turns diagram source into image bytes
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    async fn render(&self, source: &DiagramSource) -> Result<Vec<u8>, RenderError>;
}

/// Renderer that fetches images from a PlantUML server.
///
/// Every call goes to the server; nothing is cached.
pub struct PlantUmlServerRenderer {
    client: Client,
    base_url: String,
}

impl PlantUmlServerRenderer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::Transport(format!("Failed to create HTTP client: {e}")))?;

        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(Self { client, base_url })
    }

    pub fn image_url(&self, source: &DiagramSource) -> Result<String, RenderError> {
        let encoded =
            encode_plantuml(source.as_str()).map_err(|e| RenderError::Encoding(e.to_string()))?;
        Ok(format!("{}{encoded}", self.base_url))
    }
}

#[async_trait]
impl DiagramRenderer for PlantUmlServerRenderer {
    async fn render(&self, source: &DiagramSource) -> Result<Vec<u8>, RenderError> {
        let url = self.image_url(source)?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Rendering service rejected diagram");
            return Err(RenderError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;

        tracing::debug!(bytes = bytes.len(), "Diagram rendered");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::extract;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[tokio::test]
    async fn test_render_returns_image_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/png/[0-9A-Za-z_-]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC))
            .expect(1)
            .mount(&server)
            .await;

        let renderer =
            PlantUmlServerRenderer::new(&format!("{}/png", server.uri()), Duration::from_secs(5))
                .unwrap();
        let image = renderer.render(&extract("class A")).await.unwrap();
        assert_eq!(image, PNG_MAGIC);
    }

    #[tokio::test]
    async fn test_server_error_is_status_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let renderer = PlantUmlServerRenderer::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = renderer.render(&extract("class A")).await.unwrap_err();
        assert_eq!(err, RenderError::Status { status: 503 });
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_failure() {
        let renderer =
            PlantUmlServerRenderer::new("http://127.0.0.1:9/png/", Duration::from_secs(5)).unwrap();
        let err = renderer.render(&extract("class A")).await.unwrap_err();
        assert!(matches!(err, RenderError::Transport(_)));
    }

    #[test]
    fn test_image_url_appends_encoding_to_base() {
        let renderer =
            PlantUmlServerRenderer::new("https://render.example/png", Duration::from_secs(5))
                .unwrap();
        let url = renderer.image_url(&extract("class A")).unwrap();
        assert!(url.starts_with("https://render.example/png/"));
        assert!(url.len() > "https://render.example/png/".len());
    }
}
