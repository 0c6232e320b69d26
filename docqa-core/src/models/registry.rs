use serde::{Deserialize, Serialize};

/// An embedding model served by Ollama, with the vector size it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingModel {
    /// Name passed to the backend (e.g. `all-minilm`)
    pub id: String,
    pub name: String,
    pub embedding_dim: usize,
    pub description: String,
}

pub struct ModelRegistry {
    models: Vec<EmbeddingModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: default_models(),
        }
    }

    /// Looks up a model by id, ignoring any `:tag` suffix (`all-minilm:latest`).
    pub fn get(&self, id: &str) -> Option<&EmbeddingModel> {
        let base = id.split(':').next().unwrap_or(id);
        self.models.iter().find(|m| m.id == base)
    }

    /// Vector size of a known model, `None` for models the registry has never heard of.
    pub fn dimension_of(&self, id: &str) -> Option<usize> {
        self.get(id).map(|m| m.embedding_dim)
    }

    pub fn all_models(&self) -> &[EmbeddingModel] {
        &self.models
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_models() -> Vec<EmbeddingModel> {
    vec![
        EmbeddingModel {
            id: "all-minilm".to_string(),
            name: "all-MiniLM-L6-v2".to_string(),
            embedding_dim: 384,
            description: "Small sentence-transformers model, fast on CPU".to_string(),
        },
        EmbeddingModel {
            id: "nomic-embed-text".to_string(),
            name: "Nomic Embed Text".to_string(),
            embedding_dim: 768,
            description: "Good general purpose embeddings with a long context".to_string(),
        },
        EmbeddingModel {
            id: "mxbai-embed-large".to_string(),
            name: "mxbai-embed-large".to_string(),
            embedding_dim: 1024,
            description: "Higher quality, larger embeddings".to_string(),
        },
    ]
}
