use serde::{Deserialize, Serialize};

/// Raw text of a document together with the identifier it was read from.
///
/// Paginated sources (PDF) also record where each page starts, as a character
/// offset into `text`. Documents only live for the duration of an ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub page_starts: Vec<usize>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            page_starts: Vec::new(),
        }
    }

    /// Joins pages with a blank line, remembering where each one starts.
    pub fn from_pages<I, S>(id: impl Into<String>, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut page_starts = Vec::new();
        let mut chars = 0;

        for (i, page) in pages.into_iter().enumerate() {
            if i > 0 {
                text.push_str("\n\n");
                chars += 2;
            }
            page_starts.push(chars);
            text.push_str(page.as_ref());
            chars += page.as_ref().chars().count();
        }

        Self {
            id: id.into(),
            text,
            page_starts,
        }
    }

    /// 1-based page holding the character at `char_offset`, if paginated.
    pub fn page_at(&self, char_offset: usize) -> Option<usize> {
        match self.page_starts.partition_point(|&start| start <= char_offset) {
            0 => None,
            page => Some(page),
        }
    }
}

/// A contiguous span of document text, the unit of retrieval.
///
/// `char_offset` is the position of the first character of `content` within
/// the source document, counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub document_id: String,
    pub sequence_index: usize,
    pub char_offset: usize,
    pub content: String,
    /// Page the passage starts on, for paginated documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

/// A passage returned by a nearest-neighbour query and its distance to the query.
///
/// Smaller distances are better matches; results are always ordered by
/// non-decreasing distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub passage: Passage,
    pub distance: f32,
}

/// A generated answer and the passages it was grounded on, most relevant first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SearchResult>,
}
