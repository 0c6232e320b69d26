use colored::Colorize;
use docqa_core::{Answer, SearchResult};

use crate::session::SessionState;

/// Characters of passage text shown per source.
pub const EXCERPT_CHARS: usize = 300;

/// First `max_chars` characters of `content`, followed by `...`.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let mut out: String = content.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

pub fn format_source(position: usize, source: &SearchResult) -> String {
    let page = source
        .passage
        .page
        .map(|p| format!("page {p}, "))
        .unwrap_or_default();

    format!(
        "{} ({}passage {}, distance {:.4}):\n{}",
        format!("Source {position}").bold(),
        page,
        source.passage.sequence_index,
        source.distance,
        excerpt(&source.passage.content, EXCERPT_CHARS)
    )
}

pub fn print_answer(answer: &Answer) {
    println!();
    println!("{}", "Answer:".bold().green());
    println!("{}", answer.text);

    if !answer.sources.is_empty() {
        println!();
        println!("{}", "Sources:".bold());
        for (i, source) in answer.sources.iter().enumerate() {
            println!("{}", format_source(i + 1, source));
            println!();
        }
    }
}

pub fn print_history(session: &SessionState) {
    if session.is_empty() {
        println!("{}", "No questions asked yet.".yellow());
        return;
    }

    println!("{}", "Question & Answer History".bold().green());
    for (n, exchange) in session.newest_first() {
        println!("{} {}", format!("Q{n}:").bold(), exchange.question);
        println!("{} {}", "A:".bold(), exchange.answer.text);
        println!("---");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::Passage;

    #[test]
    fn test_excerpt_truncates_long_content() {
        let content = "x".repeat(400);
        let out = excerpt(&content, EXCERPT_CHARS);
        assert_eq!(out.len(), 303);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_excerpt_keeps_short_content() {
        assert_eq!(excerpt("Paris.", EXCERPT_CHARS), "Paris....");
    }

    #[test]
    fn test_excerpt_counts_characters() {
        assert_eq!(excerpt("ééé", 2), "éé...");
    }

    #[test]
    fn test_format_source_shows_position_and_passage() {
        colored::control::set_override(false);
        let source = SearchResult {
            passage: Passage {
                document_id: "atlas.txt".to_string(),
                sequence_index: 4,
                char_offset: 1800,
                content: "The capital of France is Paris.".to_string(),
                page: None,
            },
            distance: 0.25,
        };

        assert_eq!(
            format_source(2, &source),
            "Source 2 (passage 4, distance 0.2500):\nThe capital of France is Paris...."
        );
    }

    #[test]
    fn test_format_source_shows_page_when_known() {
        colored::control::set_override(false);
        let source = SearchResult {
            passage: Passage {
                document_id: "atlas.pdf".to_string(),
                sequence_index: 1,
                char_offset: 40,
                content: "Paris.".to_string(),
                page: Some(2),
            },
            distance: 0.5,
        };

        assert_eq!(
            format_source(1, &source),
            "Source 1 (page 2, passage 1, distance 0.5000):\nParis...."
        );
    }
}
