//! Document sources.
//!
//! A source turns a document path into raw text. [`FileSource`] picks the
//! reader from the file extension: PDF files go through [`PdfFileSource`],
//! everything else through [`TextFileSource`]. The pipeline only depends on
//! the [`DocumentSource`] trait, so other formats can be plugged in by the
//! caller.

use crate::rag::Document;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document {} is unreadable: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document {} is not a readable PDF: {reason}", .path.display())]
    InvalidPdf { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Provides the raw text of a document given its path.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn read(&self, path: &Path) -> Result<Document>;
}

/// Reads plain-text files.
///
/// Files that are not valid UTF-8 are decoded lossily rather than rejected.
/// The document id is the path as given by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFileSource;

#[async_trait]
impl DocumentSource for TextFileSource {
    async fn read(&self, path: &Path) -> Result<Document> {
        let unreadable = |source| DocumentError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let bytes = fs::read(path).await.map_err(unreadable)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), "Document is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        Ok(Document::new(path.to_string_lossy(), text))
    }
}

/// Reads PDF files page by page.
///
/// Pages are joined with a blank line and their start offsets are kept on
/// the [`Document`], so passages can report the page they come from.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfFileSource;

#[async_trait]
impl DocumentSource for PdfFileSource {
    async fn read(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path).await.map_err(|source| DocumentError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let pages = extract_pages(&bytes).map_err(|e| DocumentError::InvalidPdf {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), pages = pages.len(), "Extracted PDF text");

        if pages.iter().all(|p| p.is_empty()) {
            warn!(path = %path.display(), "PDF has no extractable text");
        }

        Ok(Document::from_pages(path.to_string_lossy(), pages))
    }
}

fn extract_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, lopdf::Error> {
    let pdf = lopdf::Document::load_mem(bytes)?;
    pdf.get_pages()
        .keys()
        .map(|&number| pdf.extract_text(&[number]).map(|text| text.trim().to_string()))
        .collect()
}

/// Chooses a reader by file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl FileSource {
    pub fn is_pdf(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn read(&self, path: &Path) -> Result<Document> {
        if Self::is_pdf(path) {
            PdfFileSource.read(path).await
        } else {
            TextFileSource.read(path).await
        }
    }
}
