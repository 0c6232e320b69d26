//! Query-time lookup of the passages most relevant to a question.

use super::embedder::Embedder;
use super::index::VectorIndex;
use super::types::SearchResult;
use super::Result;
use tracing::debug;

/// Embeds a question and fetches its nearest passages from an index.
///
/// The retriever must use the same [`Embedder`] the index was built with;
/// vectors from another embedding space make distances meaningless.
#[derive(Clone)]
pub struct Retriever {
    embedder: Embedder,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Embedder, top_k: usize) -> Self {
        Self { embedder, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieves the configured number of passages.
    pub async fn retrieve(&self, index: &VectorIndex, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve_k(index, query, self.top_k).await
    }

    /// Retrieves up to `k` passages, most relevant first, with their distances.
    ///
    /// An empty index short-circuits to no results without embedding the query.
    pub async fn retrieve_k(&self, index: &VectorIndex, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if index.is_empty() {
            debug!("Index is empty, nothing to retrieve");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        debug!("Query embedding generated, dimension: {}", query_embedding.len());

        let results = index.query(&query_embedding, k)?;
        for (i, result) in results.iter().enumerate() {
            debug!(
                "Result {}: distance={}, passage={}",
                i + 1,
                result.distance,
                result.passage.sequence_index
            );
        }

        Ok(results)
    }
}
