//! Embedding generation using LLM providers.
//!
//! This module provides functionality to convert text into vector embeddings
//! using provider embedding models.

use crate::models::ModelRegistry;
use crate::provider::{Provider, ProviderError};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// The backend could not be reached, did not answer in time, or could
    /// not find or load the model.
    #[error("Embedding model '{model}' is unavailable: {source}")]
    ModelUnavailable {
        model: String,
        #[source]
        source: ProviderError,
    },

    /// The provider API returned an error.
    #[error("Provider error: {0}")]
    Provider(#[source] ProviderError),

    /// The API response contained no embeddings.
    ///
    /// This typically indicates a problem with the model or request format.
    #[error("No embeddings returned")]
    NoEmbeddings,

    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// A vector did not match the dimension the embedder is bound to.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedderError>;

/// Generates vector embeddings for text using LLM provider embedding models.
///
/// The embedder converts text into high-dimensional vectors that capture
/// semantic meaning. These vectors can then be compared using cosine
/// similarity to find semantically similar text.
///
/// # Dimension
///
/// An embedder is bound to a single vector dimension: the registry dimension
/// for known models, otherwise the length of the first vector it receives.
/// Clones share the binding, so passages embedded at ingest time and the
/// queries embedded later are guaranteed to live in the same space.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
    batch_size: usize,
    dimension: Arc<OnceLock<usize>>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = OnceLock::new();
        if let Some(dim) = ModelRegistry::new().dimension_of(&model) {
            let _ = dimension.set(dim);
        }

        Self {
            provider,
            model,
            batch_size: 32,
            dimension: Arc::new(dimension),
        }
    }

    /// Sets how many texts are sent per backend request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The vector dimension, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    /// Generates a vector embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The backend is unreachable, times out, or cannot find or load the
    ///   model ([`EmbedderError::ModelUnavailable`])
    /// - The API returns no embeddings
    /// - The vector length differs from the bound dimension
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbedderError::NoEmbeddings)
    }

    /// Embeds many texts, preserving input order.
    ///
    /// Texts are sent in batches of `batch_size`. An empty input returns an
    /// empty output without touching the backend.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            debug!(batch_len = batch.len(), model = %self.model, "Embedding batch");
            let embeddings = self
                .provider
                .embed_batch(batch, &self.model)
                .await
                .map_err(|e| self.classify(e))?;

            if embeddings.is_empty() {
                return Err(EmbedderError::NoEmbeddings);
            }
            if embeddings.len() != batch.len() {
                return Err(EmbedderError::CountMismatch {
                    expected: batch.len(),
                    actual: embeddings.len(),
                });
            }

            for embedding in &embeddings {
                self.check_dimension(embedding.len())?;
            }
            vectors.extend(embeddings);
        }

        Ok(vectors)
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        let expected = *self.dimension.get_or_init(|| actual);
        if expected != actual {
            return Err(EmbedderError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }

    fn classify(&self, error: ProviderError) -> EmbedderError {
        if error.is_unreachable() || error.is_timeout() || error.is_model_unavailable() {
            EmbedderError::ModelUnavailable {
                model: self.model.clone(),
                source: error,
            }
        } else {
            EmbedderError::Provider(error)
        }
    }
}
