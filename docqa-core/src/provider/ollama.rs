//! Ollama provider implementation.
//!
//! This module provides an Ollama HTTP API client that implements the Provider trait.

use super::types::*;
use crate::config::LlmConfig;
use async_trait::async_trait;

use futures::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Ollama HTTP API provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    http_client: reqwest::Client,
}

impl OllamaProvider {
    /// Creates a new Ollama provider for the configured server.
    ///
    /// Every request made through the provider is bounded by `llm.timeout_secs`.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat<'a>(
        &'a self,
        request: ChatRequest,
        mut callback: Box<dyn FnMut(ChatResponse) + Send + 'a>,
    ) -> Result<()> {
        let url = format!("{}/api/chat", self.base_url);

        // Convert to Ollama-specific request format
        let ollama_request = OllamaChatRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.clone(),
                    content: m.content.clone(),
                })
                .collect(),
            options: {
                let mut opts = HashMap::new();
                opts.insert("temperature".to_string(), serde_json::json!(request.temperature));
                Some(opts)
            },
            stream: true,
        };

        let response = self.http_client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(api_error(status, &error_text));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            buffer.extend_from_slice(&chunk);

            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line = buffer.drain(..=newline_pos).collect::<Vec<_>>();
                dispatch_line(&line[..line.len() - 1], &mut callback)?;
            }
        }

        // The final object is not always newline-terminated
        if !buffer.is_empty() {
            dispatch_line(&buffer, &mut callback)?;
        }

        Ok(())
    }

    async fn embed_batch(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);

        let embed_request = EmbedRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };

        let response = self.http_client
            .post(&url)
            .json(&embed_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(api_error(status, &error_text));
        }

        let embed_response = response.json::<EmbedResponse>().await?;
        debug!(
            model = %embed_response.model,
            count = embed_response.embeddings.len(),
            "Received embeddings"
        );

        Ok(embed_response.embeddings)
    }
}

/// Parses one NDJSON line of a chat stream and forwards it to the callback.
fn dispatch_line<F>(line: &[u8], callback: &mut F) -> Result<()>
where
    F: FnMut(ChatResponse) + ?Sized,
{
    let line_str = String::from_utf8_lossy(line);
    let line_str = line_str.trim();
    if line_str.is_empty() {
        return Ok(());
    }

    match serde_json::from_str::<OllamaChatChunk>(line_str) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                return Err(classify_message(error));
            }
            callback(ChatResponse {
                model: chunk.model,
                content: chunk.message.map(|m| m.content).unwrap_or_default(),
                done: chunk.done,
            });
        }
        Err(e) => debug!("Skipping unparsable stream line: {}", e),
    }

    Ok(())
}

/// Builds the error for a non-2xx reply, preferring the `error` field of a JSON body.
fn api_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<OllamaErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());

    if status == StatusCode::NOT_FOUND {
        return ProviderError::ModelUnavailable(message);
    }
    classify_message(message)
}

/// Ollama reports missing or unloadable models only through the message text.
fn classify_message(message: String) -> ProviderError {
    let lower = message.to_lowercase();
    let missing = lower.contains("model") && lower.contains("not found");
    let unloadable = lower.contains("failed to load") || lower.contains("unable to load");

    if missing || unloadable {
        ProviderError::ModelUnavailable(message)
    } else {
        ProviderError::Api(message)
    }
}

// Ollama-specific request/response types (internal)

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<HashMap<String, serde_json::Value>>,
    stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaChatChunk {
    #[serde(default)]
    model: String,
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}
