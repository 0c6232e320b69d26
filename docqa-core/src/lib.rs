//! docqa-core - Document question answering engine
//!
//! Provides the components for answering questions about a document:
//! - LLM provider abstraction (Ollama)
//! - RAG (chunking, embedding, vector index, retrieval, answer composition)
//! - Configuration management
//! - The ingest/ask pipeline (primary interface)
//!
//! ## Primary API
//!
//! Front ends should interact with docqa via [`Pipeline`].

// Public modules
pub mod config;
pub mod document;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod rag;

// Public exports
pub use config::{Config, ConfigError, DistanceMetric};
pub use document::{DocumentError, DocumentSource, FileSource, PdfFileSource, TextFileSource};
pub use models::{EmbeddingModel, ModelRegistry};
pub use pipeline::{AskError, AskStage, IngestError, IngestResult, IngestStage, Pipeline, PipelineState};
pub use rag::{Answer, Document, Passage, RagError, SearchResult, NO_CONTEXT_ANSWER};

// Provider exports
pub use provider::{ChatRequest, ChatResponse, Message, OllamaProvider, Provider, ProviderError};
