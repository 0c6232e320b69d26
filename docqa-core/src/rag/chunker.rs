//! Text chunking for RAG.
//!
//! Documents are cut into fixed-size passages that overlap their neighbour by
//! a configurable number of characters, so that a sentence falling on a
//! boundary still appears whole in at least one passage.

use super::types::{Document, Passage};
use thiserror::Error;

/// Errors that can occur while chunking.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Invalid chunking configuration: max_len ({max_len}) must be greater than 0 and greater than overlap ({overlap})")]
    InvalidConfig { max_len: usize, overlap: usize },
}

/// Result type for chunking operations.
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Splits text into overlapping chunks of at most `max_len` characters.
///
/// Lengths are counted in Unicode scalar values, never bytes, so a chunk
/// boundary can't fall inside a multi-byte character. The window advances by
/// `max_len - overlap` characters and stops once a chunk reaches the end of
/// the text; only the last chunk can be shorter than `max_len`.
pub(crate) fn chunk_text(text: &str, max_len: usize, overlap: usize) -> Result<Vec<(usize, &str)>> {
    if max_len == 0 || max_len <= overlap {
        return Err(ChunkError::InvalidConfig { max_len, overlap });
    }

    // Byte position of every character, plus the end of the text
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    let stride = max_len - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < char_count {
        let end = (start + max_len).min(char_count);
        chunks.push((start, &text[bounds[start]..bounds[end]]));

        if end == char_count {
            break;
        }
        start += stride;
    }

    Ok(chunks)
}

/// Splits a document into passages tagged with their sequence index.
///
/// Passages of a paginated document also carry the page they start on. An
/// empty document yields no passages.
pub fn split(document: &Document, max_len: usize, overlap: usize) -> Result<Vec<Passage>> {
    let passages = chunk_text(&document.text, max_len, overlap)?
        .into_iter()
        .enumerate()
        .map(|(sequence_index, (char_offset, content))| Passage {
            document_id: document.id.clone(),
            sequence_index,
            char_offset,
            content: content.to_string(),
            page: document.page_at(char_offset),
        })
        .collect();

    Ok(passages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: Vec<(usize, &str)>) -> Vec<&str> {
        chunks.into_iter().map(|(_, text)| text).collect()
    }

    fn stitch(passages: &[Passage], overlap: usize) -> String {
        let mut out = String::new();
        for (i, passage) in passages.iter().enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            out.extend(passage.content.chars().skip(skip));
        }
        out
    }

    #[test]
    fn test_chunk_text_small() {
        let chunks = chunk_text("Hello", 10, 2).unwrap();
        assert_eq!(texts(chunks), vec!["Hello"]);
    }

    #[test]
    fn test_chunk_text_with_overlap() {
        let chunks = chunk_text("0123456789ABCDEF", 10, 2).unwrap();
        assert_eq!(texts(chunks), vec!["0123456789", "89ABCDEF"]);
    }

    #[test]
    fn test_chunk_text_offsets_follow_stride() {
        let chunks = chunk_text("abcdefghijklmnopqrstuvwxyz", 10, 3).unwrap();
        let offsets: Vec<usize> = chunks.iter().map(|(offset, _)| *offset).collect();
        assert_eq!(offsets, vec![0, 7, 14, 21]);
        assert_eq!(chunks[3].1, "vwxyz");
    }

    #[test]
    fn test_chunk_text_exact_length_is_single_chunk() {
        let chunks = chunk_text("0123456789", 10, 2).unwrap();
        assert_eq!(texts(chunks), vec!["0123456789"]);
    }

    #[test]
    fn test_chunk_text_counts_characters_not_bytes() {
        let text = "héllo wörld ünïcode";
        let chunks = chunk_text(text, 5, 1).unwrap();
        for (_, chunk) in &chunks {
            assert!(chunk.chars().count() <= 5);
        }
        assert_eq!(chunks[0].1, "héllo");
        assert_eq!(chunks[1].1, "o wör");
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text("", 500, 50).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert_eq!(
            chunk_text("abc", 5, 5).unwrap_err(),
            ChunkError::InvalidConfig { max_len: 5, overlap: 5 }
        );
        assert!(chunk_text("abc", 5, 9).is_err());
        assert!(chunk_text("abc", 0, 0).is_err());
        assert!(split(&Document::new("doc", "abc"), 50, 50).is_err());
    }

    #[test]
    fn test_split_assigns_sequence_and_document() {
        let document = Document::new("notes.txt", "a".repeat(25));
        let passages = split(&document, 10, 0).unwrap();

        assert_eq!(passages.len(), 3);
        for (i, passage) in passages.iter().enumerate() {
            assert_eq!(passage.sequence_index, i);
            assert_eq!(passage.document_id, "notes.txt");
            assert_eq!(passage.char_offset, i * 10);
        }
        assert_eq!(passages[2].content.len(), 5);
    }

    #[test]
    fn test_stitching_reconstructs_text() {
        let text: String = (0..2_000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let document = Document::new("doc", text.clone());

        for (max_len, overlap) in [(500, 50), (7, 0), (7, 6), (1, 0), (3_000, 10)] {
            let passages = split(&document, max_len, overlap).unwrap();
            assert_eq!(stitch(&passages, overlap), text, "max_len={max_len} overlap={overlap}");
            for passage in &passages[..passages.len() - 1] {
                assert_eq!(passage.content.chars().count(), max_len);
            }
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let document = Document::new("doc", "The quick brown fox jumps over the lazy dog. ".repeat(40));
        assert_eq!(split(&document, 100, 20).unwrap(), split(&document, 100, 20).unwrap());
    }

    #[test]
    fn test_split_tags_passages_with_start_page() {
        let document = Document::from_pages("report.pdf", ["a".repeat(12), "b".repeat(12)]);
        let passages = split(&document, 10, 0).unwrap();

        let pages: Vec<Option<usize>> = passages.iter().map(|p| p.page).collect();
        assert_eq!(pages, vec![Some(1), Some(1), Some(2)]);
        assert_eq!(passages[1].content, "aa\n\nbbbbbb");
    }

    #[test]
    fn test_plain_text_passages_have_no_page() {
        let passages = split(&Document::new("notes.txt", "x".repeat(30)), 10, 2).unwrap();
        assert!(passages.iter().all(|p| p.page.is_none()));
    }

    proptest::proptest! {
        #[test]
        fn prop_passages_cover_text_in_order(
            text in "\\PC{0,300}",
            max_len in 1usize..64,
            overlap_seed in 0usize..64,
        ) {
            let overlap = overlap_seed % max_len;
            let document = Document::new("doc", text.clone());
            let passages = split(&document, max_len, overlap).unwrap();
            let chars: Vec<char> = text.chars().collect();

            proptest::prop_assert_eq!(stitch(&passages, overlap), text);
            for (i, passage) in passages.iter().enumerate() {
                let len = passage.content.chars().count();
                proptest::prop_assert!(len >= 1 && len <= max_len);
                proptest::prop_assert_eq!(passage.sequence_index, i);
                let expected: String = chars[passage.char_offset..passage.char_offset + len].iter().collect();
                proptest::prop_assert_eq!(&passage.content, &expected);
            }
        }
    }
}
