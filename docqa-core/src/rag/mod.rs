//! Retrieval Augmented Generation (RAG) over a single document.
//!
//! # Overview
//!
//! RAG (Retrieval Augmented Generation) combines:
//! 1. **Retrieval**: finding the passages of a document relevant to a question
//! 2. **Augmentation**: adding those passages as context to the model prompt
//! 3. **Generation**: the model answers using only that context
//!
//! # Architecture
//!
//! - [`chunker`]: splits document text into overlapping passages
//! - [`embedder`]: converts text to vector embeddings via a [`Provider`](crate::provider::Provider)
//! - [`index`]: persisted nearest-neighbour index over passage vectors
//! - [`retriever`]: embeds a question and looks up its nearest passages
//! - [`composer`]: builds the grounded prompt and generates the answer
//!
//! The [`Pipeline`](crate::pipeline::Pipeline) wires these together.
//!
//! # How It Works
//!
//! 1. **Ingest**:
//!    - The document is split into passages (default: 500 characters, 50 overlap)
//!    - Each passage is embedded in batches
//!    - The vectors are written to disk and reloaded
//!
//! 2. **Ask**:
//!    - The question is embedded with the same model
//!    - The index returns the k nearest passages
//!    - The passages and question fill the prompt template and the model answers

pub mod chunker;
pub mod composer;
pub mod embedder;
pub mod index;
pub mod retriever;
mod types;

pub use chunker::ChunkError;
pub use composer::{AnswerComposer, ComposerError, NO_CONTEXT_ANSWER, PROMPT_TEMPLATE};
pub use embedder::{Embedder, EmbedderError};
pub use index::{IndexError, VectorIndex};
pub use retriever::Retriever;
pub use types::{Answer, Document, Passage, SearchResult};

use crate::config::ConfigError;
use crate::document::DocumentError;
use crate::provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Composer error: {0}")]
    Composer(#[from] ComposerError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No document has been ingested yet")]
    NotReady,
}

pub type Result<T> = std::result::Result<T, RagError>;
