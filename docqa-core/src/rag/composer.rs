//! Grounded answer generation.
//!
//! The composer stuffs the retrieved passages into a fixed prompt and asks the
//! generative model to answer from that context only.

use super::types::{Answer, SearchResult};
use crate::provider::{ChatRequest, Message, Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Prompt sent to the generative model. `{context}` and `{question}` are
/// substituted before the call.
pub const PROMPT_TEMPLATE: &str = "
Use the pieces of information provided in the context to answer the user's question.
If you don't know the answer, just say you don't know. Don't try to make up an answer.
Only use the provided context.

Context: {context}
Question: {question}

Start the answer directly. No small talk.
";

/// Returned without calling the model when retrieval found nothing.
pub const NO_CONTEXT_ANSWER: &str =
    "I don't know. The document does not contain any information to answer this question.";

#[derive(Debug, Error)]
pub enum ComposerError {
    /// The generation backend cannot be reached, or the model cannot be
    /// found or loaded.
    #[error("Generation model '{model}' is unavailable: {source}")]
    ModelUnavailable {
        model: String,
        #[source]
        source: ProviderError,
    },

    /// The model call failed, timed out, or produced nothing usable.
    #[error("Generation with model '{model}' failed: {reason}")]
    GenerationFailed {
        model: String,
        reason: String,
        #[source]
        source: Option<ProviderError>,
    },
}

pub type Result<T> = std::result::Result<T, ComposerError>;

/// Builds the grounding prompt for a question.
///
/// Passages are joined with a blank line, in the order given.
pub fn build_prompt(question: &str, passages: &[SearchResult]) -> String {
    let context = passages
        .iter()
        .map(|r| r.passage.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    PROMPT_TEMPLATE
        .replace("{context}", &context)
        .replace("{question}", question)
}

/// Turns a question and its retrieved passages into an [`Answer`].
#[derive(Clone)]
pub struct AnswerComposer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f64,
}

impl AnswerComposer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generates an answer grounded in `passages`.
    ///
    /// The returned sources are exactly the passages given, in the same order.
    /// Failures are reported once; nothing is retried.
    pub async fn answer(&self, question: &str, passages: Vec<SearchResult>) -> Result<Answer> {
        if passages.is_empty() {
            info!("No passages retrieved, answering without the model");
            return Ok(Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                sources: passages,
            });
        }

        let prompt = build_prompt(question, &passages);
        debug!(prompt_len = prompt.len(), passages = passages.len(), "Composed prompt");

        let request = ChatRequest::new(&self.model, vec![Message::user(prompt)])
            .with_temperature(self.temperature);

        let mut accumulated_content = String::new();
        self.provider
            .chat(request, Box::new(|response| {
                accumulated_content.push_str(&response.content);
            }))
            .await
            .map_err(|e| self.classify(e))?;

        let text = accumulated_content.trim();
        if text.is_empty() {
            return Err(ComposerError::GenerationFailed {
                model: self.model.clone(),
                reason: "model returned an empty response".to_string(),
                source: None,
            });
        }

        info!(answer_len = text.len(), sources = passages.len(), "Generated answer");
        Ok(Answer {
            text: text.to_string(),
            sources: passages,
        })
    }

    fn classify(&self, error: ProviderError) -> ComposerError {
        if error.is_unreachable() || error.is_model_unavailable() {
            ComposerError::ModelUnavailable {
                model: self.model.clone(),
                source: error,
            }
        } else {
            ComposerError::GenerationFailed {
                model: self.model.clone(),
                reason: error.to_string(),
                source: Some(error),
            }
        }
    }
}
