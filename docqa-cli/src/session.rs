//! Question/answer history for one interactive session.

use docqa_core::Answer;

#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: String,
    pub answer: Answer,
}

/// History of successful exchanges, kept in memory for the session only.
#[derive(Debug, Default)]
pub struct SessionState {
    history: Vec<Exchange>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successful exchange. Failed asks are never recorded.
    pub fn record(&mut self, question: impl Into<String>, answer: Answer) {
        self.history.push(Exchange {
            question: question.into(),
            answer,
        });
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Exchanges newest first, each with its 1-based position in the session.
    pub fn newest_first(&self) -> impl Iterator<Item = (usize, &Exchange)> {
        self.history.iter().enumerate().rev().map(|(i, e)| (i + 1, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> Answer {
        Answer {
            text: text.to_string(),
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = SessionState::new();
        assert!(session.is_empty());
        assert_eq!(session.newest_first().count(), 0);
    }

    #[test]
    fn test_history_is_numbered_newest_first() {
        let mut session = SessionState::new();
        session.record("first?", answer("one"));
        session.record("second?", answer("two"));
        session.record("third?", answer("three"));

        let listed: Vec<(usize, &str)> = session
            .newest_first()
            .map(|(n, e)| (n, e.question.as_str()))
            .collect();

        assert_eq!(session.len(), 3);
        assert_eq!(listed, vec![(3, "third?"), (2, "second?"), (1, "first?")]);
    }
}
