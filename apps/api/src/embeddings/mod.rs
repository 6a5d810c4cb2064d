//! Embedding service client (Cohere Embed API v2).
//!
//! One fixed-length float vector is returned per input text, in input order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

const EMBED_PATH: &str = "/v2/embed";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed embedding response: {0}")]
    Malformed(String),
}

impl EmbeddingError {
    pub fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EmbeddingError::Api { status, .. } => *status == 429 || *status >= 500,
            EmbeddingError::Malformed(_) => false,
        }
    }
}

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [&'a str],
    input_type: &'a str,
    embedding_types: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: EmbeddingsByType,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsByType {
    float: Option<Vec<Vec<f32>>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        retry: RetryPolicy,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            retry,
        })
    }

    async fn embed_once(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbedRequest {
            model: &self.model,
            texts,
            input_type: "search_document",
            embedding_types: ["float"],
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, EMBED_PATH))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: EmbedResponse = serde_json::from_str(&body)
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

        parsed
            .embeddings
            .float
            .ok_or_else(|| EmbeddingError::Malformed("no float embeddings in response".to_string()))
    }
}

#[async_trait]
impl EmbeddingService for EmbeddingClient {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.retry
            .run(
                "Embedding call",
                || self.embed_once(texts),
                EmbeddingError::is_retryable,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EmbeddingClient {
        EmbeddingClient::new(
            "test-key".to_string(),
            server.uri(),
            "embed-english-v3.0".to_string(),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_embed_returns_vectors_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/embed"))
            .and(body_partial_json(json!({
                "texts": ["resume", "job"],
                "embedding_types": ["float"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "e-1",
                "embeddings": {"float": [[1.0, 0.0], [0.0, 1.0]]}
            })))
            .mount(&server)
            .await;

        let vectors = client_for(&server).embed(&["resume", "job"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).embed(&["a", "b"]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_missing_float_embeddings_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": {}})))
            .mount(&server)
            .await;

        let err = client_for(&server).embed(&["a", "b"]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_server_error_retried_then_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/embed"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
            .expect(3)
            .mount(&server)
            .await;

        let err = client_for(&server).embed(&["a", "b"]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Api { status: 500, .. }));
    }
}
