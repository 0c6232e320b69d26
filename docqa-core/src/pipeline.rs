//! Ingest/ask orchestration.
//!
//! [`Pipeline`] is the one interface a front end consumes. It owns the model
//! provider handle, the document source and the currently loaded index, and
//! moves between two states:
//!
//! - [`PipelineState::Unready`]: nothing ingested, [`Pipeline::ask`] fails
//! - [`PipelineState::Ready`]: an index is loaded and questions can be asked
//!
//! Only a successful [`Pipeline::ingest`] moves the pipeline to `Ready`. A
//! failed ingest always leaves it `Unready`; a failed ask leaves it as it was.

use crate::config::Config;
use crate::document::{DocumentSource, FileSource};
use crate::provider::{OllamaProvider, Provider};
use crate::rag::{
    chunker, AnswerComposer, Answer, Document, Embedder, IndexError, Passage, RagError, Retriever,
    VectorIndex,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Stage of an ingest at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Read,
    Chunk,
    Embed,
    Build,
    Persist,
    Reload,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Read => "read",
            IngestStage::Chunk => "chunk",
            IngestStage::Embed => "embed",
            IngestStage::Build => "build",
            IngestStage::Persist => "persist",
            IngestStage::Reload => "reload",
        };
        f.write_str(name)
    }
}

/// Stage of an ask at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskStage {
    Precondition,
    Retrieve,
    Compose,
}

impl fmt::Display for AskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AskStage::Precondition => "precondition",
            AskStage::Retrieve => "retrieve",
            AskStage::Compose => "compose",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("Ingest failed during {stage}: {source}")]
pub struct IngestError {
    pub stage: IngestStage,
    #[source]
    pub source: RagError,
}

#[derive(Debug, Error)]
#[error("Ask failed during {stage}: {source}")]
pub struct AskError {
    pub stage: AskStage,
    #[source]
    pub source: RagError,
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResult {
    pub document_id: String,
    pub passage_count: usize,
    pub index_path: PathBuf,
}

/// Whether the pipeline has an index to answer from.
#[derive(Debug, Clone, Default)]
pub enum PipelineState {
    #[default]
    Unready,
    Ready {
        index: VectorIndex,
        document_id: String,
    },
}

impl PipelineState {
    pub fn is_ready(&self) -> bool {
        matches!(self, PipelineState::Ready { .. })
    }
}

trait StageExt<T> {
    fn at_ingest(self, stage: IngestStage) -> std::result::Result<T, IngestError>;
    fn at_ask(self, stage: AskStage) -> std::result::Result<T, AskError>;
}

impl<T, E: Into<RagError>> StageExt<T> for std::result::Result<T, E> {
    fn at_ingest(self, stage: IngestStage) -> std::result::Result<T, IngestError> {
        self.map_err(|e| IngestError {
            stage,
            source: e.into(),
        })
    }

    fn at_ask(self, stage: AskStage) -> std::result::Result<T, AskError> {
        self.map_err(|e| AskError {
            stage,
            source: e.into(),
        })
    }
}

/// Document question-answering pipeline.
///
/// # Example
///
/// ```no_run
/// # use docqa_core::{Config, Pipeline};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut pipeline = Pipeline::new(Config::default())?;
/// pipeline.ingest("report.txt").await?;
/// let answer = pipeline.ask("What is the conclusion?").await?;
/// println!("{}", answer.text);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    config: Config,
    source: Arc<dyn DocumentSource>,
    embedder: Embedder,
    retriever: Retriever,
    composer: AnswerComposer,
    state: PipelineState,
}

impl Pipeline {
    /// Creates a pipeline talking to Ollama and reading text or PDF files.
    pub fn new(config: Config) -> crate::rag::Result<Self> {
        config.validate()?;
        let provider = Arc::new(OllamaProvider::new(&config.llm)?);
        Self::with_provider(config, provider)
    }

    /// Creates a pipeline over an arbitrary model provider.
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> crate::rag::Result<Self> {
        config.validate()?;

        let embedder = Embedder::new(provider.clone(), config.rag.embedding_model.clone())
            .with_batch_size(config.rag.batch_size);
        let retriever = Retriever::new(embedder.clone(), config.rag.top_k);
        let composer = AnswerComposer::new(provider, config.llm.model.clone())
            .with_temperature(config.llm.temperature);

        debug!(
            llm = %config.llm.model,
            embedding_model = %config.rag.embedding_model,
            "Pipeline created"
        );

        Ok(Self {
            config,
            source: Arc::new(FileSource),
            embedder,
            retriever,
            composer,
            state: PipelineState::Unready,
        })
    }

    /// Replaces the document source used by [`ingest`](Self::ingest).
    pub fn with_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Reads, chunks, embeds and indexes a document, replacing any previous index.
    ///
    /// On success the pipeline is `Ready`. On failure it is `Unready`, even
    /// if a previous ingest had succeeded.
    pub async fn ingest(&mut self, path: impl AsRef<Path>) -> Result<IngestResult, IngestError> {
        let path = path.as_ref();
        self.state = PipelineState::Unready;

        info!(path = %path.display(), "Ingesting document");
        let document = self.source.read(path).await.at_ingest(IngestStage::Read)?;
        self.ingest_document(document).await
    }

    /// Ingests a document whose text is already in memory.
    pub async fn ingest_document(&mut self, document: Document) -> Result<IngestResult, IngestError> {
        self.state = PipelineState::Unready;

        if document.text.is_empty() {
            warn!(document = %document.id, "Document is empty");
        }

        let passages = chunker::split(
            &document,
            self.config.rag.chunk_size,
            self.config.rag.chunk_overlap,
        )
        .at_ingest(IngestStage::Chunk)?;
        let passage_count = passages.len();
        info!(document = %document.id, passage_count, "Split document into passages");

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await.at_ingest(IngestStage::Embed)?;
        info!(count = vectors.len(), "Embedded passages");

        let pairs: Vec<(Vec<f32>, Passage)> = vectors.into_iter().zip(passages).collect();
        let index = VectorIndex::build(pairs, self.config.rag.metric, self.embedder.model())
            .at_ingest(IngestStage::Build)?;

        let index_path = PathBuf::from(&self.config.storage.index_path);
        index.persist(&index_path).at_ingest(IngestStage::Persist)?;

        let reloaded = VectorIndex::load(&index_path).at_ingest(IngestStage::Reload)?;
        if reloaded != index {
            return Err(IngestError {
                stage: IngestStage::Reload,
                source: RagError::Index(IndexError::Corrupt {
                    path: index_path,
                    reason: format!(
                        "reloaded index differs from the one built ({} of {} entries)",
                        reloaded.len(),
                        index.len()
                    ),
                }),
            });
        }

        info!(document = %document.id, passage_count, "Document ingested");
        self.state = PipelineState::Ready {
            index: reloaded,
            document_id: document.id.clone(),
        };

        Ok(IngestResult {
            document_id: document.id,
            passage_count,
            index_path,
        })
    }

    /// Answers a question using the configured number of passages.
    pub async fn ask(&self, question: &str) -> Result<Answer, AskError> {
        self.ask_with_k(question, self.config.rag.top_k).await
    }

    /// Answers a question from the `k` passages nearest to it.
    ///
    /// Fails with [`RagError::NotReady`] before the first successful ingest.
    /// A failed ask leaves the loaded index untouched.
    pub async fn ask_with_k(&self, question: &str, k: usize) -> Result<Answer, AskError> {
        let PipelineState::Ready { index, .. } = &self.state else {
            return Err(AskError {
                stage: AskStage::Precondition,
                source: RagError::NotReady,
            });
        };
        if k == 0 {
            return Err(AskError {
                stage: AskStage::Precondition,
                source: RagError::InvalidConfig("k must be at least 1".to_string()),
            });
        }

        debug!(question, k, "Answering question");
        let passages = self
            .retriever
            .retrieve_k(index, question, k)
            .await
            .at_ask(AskStage::Retrieve)?;

        let answer = self
            .composer
            .answer(question, passages)
            .await
            .at_ask(AskStage::Compose)?;

        info!(sources = answer.sources.len(), "Question answered");
        Ok(answer)
    }

    /// Releases the model handle and the loaded index.
    pub fn close(self) {
        info!(ready = self.state.is_ready(), "Closing pipeline");
    }
}
