//! Embedding providers.
//!
//! Index construction and querying only see the [`EmbeddingProvider`] trait;
//! [`OpenAIProvider`] is the hosted implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, EmbeddingResult};

/// Default OpenAI API endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI embedding model.
pub const OPENAI_DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Largest number of inputs accepted by one OpenAI embeddings request.
pub const OPENAI_MAX_BATCH_INPUTS: usize = 2048;

/// Request for generating embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use (provider-specific).
    pub model: Option<String>,

    /// Dimensions for the output (if supported by provider).
    pub dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            dimensions: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
///
/// Implementations must be deterministic enough for a fixed model that
/// repeated calls preserve relative similarity ordering.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> EmbeddingResult<EmbeddingResponse>;

    /// Generate embeddings for multiple texts, in request order.
    ///
    /// Fails as a whole if any single request fails.
    async fn embed_batch(
        &self,
        requests: Vec<EmbeddingRequest>,
    ) -> EmbeddingResult<Vec<EmbeddingResponse>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.embed(request).await?);
        }
        Ok(results)
    }

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// OpenAI embedding provider.
pub struct OpenAIProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,

    /// Output dimensions applied to requests that do not set their own.
    dimensions: Option<usize>,

    /// Per-request timeout.
    timeout: Option<Duration>,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider, reading the key from `OPENAI_API_KEY`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: OPENAI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            default_model: OPENAI_DEFAULT_MODEL.to_string(),
            dimensions: None,
            timeout: None,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Request shortened embeddings (text-embedding-3 models only).
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn resolve(&self, request: &EmbeddingRequest) -> (String, Option<usize>) {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        (model, request.dimensions.or(self.dimensions))
    }

    /// Send one embeddings request and return its vectors in input order.
    async fn request_embeddings(
        &self,
        inputs: &[&str],
        model: &str,
        dimensions: Option<usize>,
    ) -> EmbeddingResult<OpenAIEmbeddingResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        let mut body = if let [single] = inputs {
            serde_json::json!({ "input": single, "model": model })
        } else {
            serde_json::json!({ "input": inputs, "model": model })
        };
        if let Some(dims) = dimensions {
            body["dimensions"] = serde_json::json!(dims);
        }

        debug!(
            "Requesting {} embedding(s) with model: {model}",
            inputs.len()
        );

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&body);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest {
                status: status.as_u16(),
                message,
            });
        }

        let mut result: OpenAIEmbeddingResponse = response.json().await?;
        if result.data.len() != inputs.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                result.data.len()
            )));
        }
        result.data.sort_by_key(|item| item.index);
        if result
            .data
            .iter()
            .enumerate()
            .any(|(position, item)| item.index != position)
        {
            return Err(EmbeddingError::InvalidResponse(
                "embedding indices do not cover the inputs".to_string(),
            ));
        }

        Ok(result)
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn default_dimension(&self) -> usize {
        if let Some(dims) = self.dimensions {
            return dims;
        }
        match self.default_model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }

    async fn embed(&self, request: EmbeddingRequest) -> EmbeddingResult<EmbeddingResponse> {
        let (model, dimensions) = self.resolve(&request);
        let result = self
            .request_embeddings(&[request.text.as_str()], &model, dimensions)
            .await?;

        let tokens_used = result.usage.map(|u| u.total_tokens);
        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))?
            .embedding;
        let dimension = embedding.len();

        debug!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model: result.model,
            dimension,
            tokens_used,
        })
    }

    async fn embed_batch(
        &self,
        requests: Vec<EmbeddingRequest>,
    ) -> EmbeddingResult<Vec<EmbeddingResponse>> {
        let mut responses = Vec::with_capacity(requests.len());
        let mut start = 0;

        // Consecutive requests sharing a model and dimension setting go out
        // together, at most OPENAI_MAX_BATCH_INPUTS per call.
        while start < requests.len() {
            let key = self.resolve(&requests[start]);
            let mut end = start + 1;
            while end < requests.len()
                && end - start < OPENAI_MAX_BATCH_INPUTS
                && self.resolve(&requests[end]) == key
            {
                end += 1;
            }

            let (model, dimensions) = &key;
            let texts: Vec<&str> = requests[start..end]
                .iter()
                .map(|r| r.text.as_str())
                .collect();
            let result = self.request_embeddings(&texts, model, *dimensions).await?;

            responses.extend(result.data.into_iter().map(|item| {
                let dimension = item.embedding.len();
                EmbeddingResponse {
                    embedding: item.embedding,
                    model: result.model.clone(),
                    dimension,
                    tokens_used: None,
                }
            }));
            start = end;
        }

        info!("Generated {} batch embeddings", responses.len());

        Ok(responses)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    model: String,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new("Hello world")
            .with_model("text-embedding-3-small")
            .with_dimensions(512);

        assert_eq!(request.text, "Hello world");
        assert_eq!(request.model, Some("text-embedding-3-small".to_string()));
        assert_eq!(request.dimensions, Some(512));
    }

    #[test]
    fn test_openai_provider_default_dimensions() {
        let provider = OpenAIProvider::new().with_model("text-embedding-3-large");
        assert_eq!(provider.default_dimension(), 3072);

        let shortened = OpenAIProvider::new().with_dimensions(256);
        assert_eq!(shortened.default_dimension(), 256);
    }

    #[test]
    fn test_request_settings_override_provider_defaults() {
        let provider = OpenAIProvider::new().with_dimensions(256);

        let plain = provider.resolve(&EmbeddingRequest::new("a"));
        assert_eq!(plain, (OPENAI_DEFAULT_MODEL.to_string(), Some(256)));

        let custom = provider.resolve(
            &EmbeddingRequest::new("a")
                .with_model("text-embedding-3-large")
                .with_dimensions(64),
        );
        assert_eq!(custom, ("text-embedding-3-large".to_string(), Some(64)));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let provider = OpenAIProvider {
            api_key: None,
            ..OpenAIProvider::new().with_base_url("http://127.0.0.1:9")
        };

        assert!(!provider.is_available());
        let err = provider.embed(EmbeddingRequest::new("apple")).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderNotConfigured));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let provider = OpenAIProvider {
            api_key: None,
            ..OpenAIProvider::new()
        };
        let responses = provider.embed_batch(Vec::new()).await.unwrap();
        assert!(responses.is_empty());
    }
}
