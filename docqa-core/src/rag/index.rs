//! Vector index with on-disk persistence.
//!
//! The index keeps every (vector, passage) pair in memory and answers
//! k-nearest-neighbour queries with an exact linear scan. It is saved as a
//! single `index.json` file inside the index directory, written to a temporary
//! file first and renamed into place so a reader never sees a half-written
//! index.

use super::types::{Passage, SearchResult};
use crate::config::DistanceMetric;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

const INDEX_FILE: &str = "index.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("No index found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Index at {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Vector dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexEntry {
    vector: Vec<f32>,
    passage: Passage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    embedding_model: String,
    metric: DistanceMetric,
    dimension: usize,
    count: usize,
    checksum: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    manifest: Manifest,
    entries: Vec<IndexEntry>,
}

/// An exact nearest-neighbour index over passage embeddings.
///
/// Entries keep their insertion order, which is also the tie-break order of
/// [`query`](Self::query).
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
    metric: DistanceMetric,
    embedding_model: String,
}

impl VectorIndex {
    /// Builds an index in memory from (vector, passage) pairs.
    ///
    /// All vectors must share one dimension. An empty index has dimension 0
    /// and accepts queries of any dimension, returning nothing.
    pub fn build(
        pairs: Vec<(Vec<f32>, Passage)>,
        metric: DistanceMetric,
        embedding_model: impl Into<String>,
    ) -> Result<Self> {
        let dimension = pairs.first().map(|(v, _)| v.len()).unwrap_or(0);

        let mut entries = Vec::with_capacity(pairs.len());
        for (vector, passage) in pairs {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            entries.push(IndexEntry { vector, passage });
        }

        debug!(count = entries.len(), dimension, "Built vector index");

        Ok(Self {
            entries,
            dimension,
            metric,
            embedding_model: embedding_model.into(),
        })
    }

    /// Writes the index to `dir/index.json`, replacing any previous index atomically.
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let file = IndexFile {
            manifest: Manifest {
                format_version: FORMAT_VERSION,
                embedding_model: self.embedding_model.clone(),
                metric: self.metric,
                dimension: self.dimension,
                count: self.entries.len(),
                checksum: checksum(&self.entries),
            },
            entries: self.entries.clone(),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &file)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(dir.join(INDEX_FILE)).map_err(|e| e.error)?;

        info!(path = %dir.display(), count = self.entries.len(), "Persisted vector index");
        Ok(())
    }

    /// Loads an index previously written by [`persist`](Self::persist).
    ///
    /// # Errors
    ///
    /// - [`IndexError::NotFound`] if `dir` holds no index
    /// - [`IndexError::Corrupt`] if the file cannot be parsed, was written by an
    ///   unknown format version, or its contents disagree with the manifest
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            return Err(IndexError::NotFound(dir.to_path_buf()));
        }

        let corrupt = |reason: String| IndexError::Corrupt {
            path: path.clone(),
            reason,
        };

        let bytes = fs::read(&path)?;
        let file: IndexFile = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        let manifest = file.manifest;

        if manifest.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {}",
                manifest.format_version
            )));
        }
        if manifest.count != file.entries.len() {
            return Err(corrupt(format!(
                "manifest lists {} entries, file holds {}",
                manifest.count,
                file.entries.len()
            )));
        }
        if let Some(entry) = file.entries.iter().find(|e| e.vector.len() != manifest.dimension) {
            return Err(corrupt(format!(
                "vector of dimension {} in a {}-dimensional index",
                entry.vector.len(),
                manifest.dimension
            )));
        }
        if checksum(&file.entries) != manifest.checksum {
            return Err(corrupt("checksum mismatch".to_string()));
        }

        info!(path = %dir.display(), count = file.entries.len(), "Loaded vector index");

        Ok(Self {
            entries: file.entries,
            dimension: manifest.dimension,
            metric: manifest.metric,
            embedding_model: manifest.embedding_model,
        })
    }

    /// Returns up to `k` passages nearest to `vector`, by non-decreasing distance.
    ///
    /// Equal distances keep insertion order. If the index holds fewer than
    /// `k` entries, all of them are returned.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (self.distance(vector, &entry.vector), entry))
            .collect();

        // Stable sort, so ties stay in insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, entry)| SearchResult {
                passage: entry.passage.clone(),
                distance,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
            DistanceMetric::L2 => l2_distance(a, b),
        }
    }
}

/// Computes cosine similarity between two vectors.
///
/// Returns values from -1.0 (opposite) to 1.0 (identical), with 0.0 indicating
/// orthogonal vectors. Returns 0.0 for mismatched lengths or zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// SHA-256 over passage identity, text and vector bytes, hex encoded.
fn checksum(entries: &[IndexEntry]) -> String {
    let mut hasher = Sha256::new();
    for entry in entries {
        let passage = &entry.passage;
        hasher.update((passage.document_id.len() as u64).to_le_bytes());
        hasher.update(passage.document_id.as_bytes());
        hasher.update((passage.sequence_index as u64).to_le_bytes());
        hasher.update((passage.char_offset as u64).to_le_bytes());
        hasher.update((passage.page.unwrap_or(0) as u64).to_le_bytes());
        hasher.update((passage.content.len() as u64).to_le_bytes());
        hasher.update(passage.content.as_bytes());
        for value in &entry.vector {
            hasher.update(value.to_le_bytes());
        }
    }

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
