//! Deterministic in-process model backend for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use docqa_core::provider::Result;
use docqa_core::{ChatRequest, ChatResponse, Config, Provider, ProviderError};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const DIM: usize = 256;
pub const EMBEDDING_MODEL: &str = "fake-embed";
pub const CHAT_MODEL: &str = "fake-chat";

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "that", "the", "this", "to", "was", "what", "which", "who", "with",
];

/// Embeds text as a hashed bag of words and "generates" by quoting the
/// context sentence that shares the most words with the question.
#[derive(Default)]
pub struct FakeProvider {
    pub fail_embed: AtomicBool,
    pub fail_chat: AtomicBool,
    pub embed_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_embed(&self, fail: bool) {
        self.fail_embed.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_chat(&self, fail: bool) {
        self.fail_chat.store(fail, Ordering::SeqCst);
    }
}

pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

pub fn hashed_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIM];
    for word in words(text) {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        vector[(hasher.finish() % DIM as u64) as usize] += 1.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    vector
}

fn section<'p>(prompt: &'p str, start: &str, end: &str) -> &'p str {
    let Some(from) = prompt.find(start).map(|i| i + start.len()) else {
        return "";
    };
    let to = prompt[from..].find(end).map(|i| from + i).unwrap_or(prompt.len());
    &prompt[from..to]
}

fn extract_answer(prompt: &str) -> String {
    let context = section(prompt, "Context: ", "\nQuestion: ");
    let question = words(section(prompt, "Question: ", "\n"));

    context
        .split_inclusive('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .max_by_key(|sentence| {
            let overlap = words(sentence).iter().filter(|w| question.contains(w)).count();
            (overlap, sentence.ends_with('.'))
        })
        .unwrap_or("I don't know.")
        .to_string()
}

#[async_trait]
impl Provider for FakeProvider {
    async fn chat<'a>(
        &'a self,
        request: ChatRequest,
        mut callback: Box<dyn FnMut(ChatResponse) + Send + 'a>,
    ) -> Result<()> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_chat.load(Ordering::SeqCst) {
            return Err(ProviderError::Api("generation backend crashed".to_string()));
        }

        let prompt = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let answer = extract_answer(prompt);

        // Stream word by word like a real backend
        for word in answer.split_inclusive(' ') {
            callback(ChatResponse {
                model: request.model.clone(),
                content: word.to_string(),
                done: false,
            });
        }
        callback(ChatResponse {
            model: request.model.clone(),
            content: String::new(),
            done: true,
        });
        Ok(())
    }

    async fn embed_batch(&self, texts: &[String], _model: &str) -> Result<Vec<Vec<f32>>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed.load(Ordering::SeqCst) {
            return Err(ProviderError::Api("embedding backend crashed".to_string()));
        }
        Ok(texts.iter().map(|t| hashed_embedding(t)).collect())
    }
}

/// Default configuration with the fake models and an index under `dir`.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.llm.model = CHAT_MODEL.to_string();
    config.rag.embedding_model = EMBEDDING_MODEL.to_string();
    config.storage.index_path = dir.join("db_index").to_string_lossy().into_owned();
    config
}

const FILLER: &[&str] = &[
    "Rainfall in the northern valleys tends to peak during late autumn.",
    "Local bakeries usually open their doors before sunrise.",
    "Mountain trails become icy once temperatures drop below freezing.",
    "Most village libraries lend books for three weeks at a time.",
    "Fishing boats return to harbour when the evening tide rises.",
    "Wool from highland sheep is prized for its warmth and strength.",
];

/// A roughly three-page document whose second page states the capital of France.
pub fn three_page_document() -> String {
    let page = |offset: usize| -> String {
        (0..24)
            .map(|i| FILLER[(i + offset) % FILLER.len()])
            .collect::<Vec<_>>()
            .join(" ")
    };

    let first = page(0);
    let second = format!("{} The capital of France is Paris. {}", page(1), page(2));
    let third = page(3);

    format!("{first}\n\n{second}\n\n{third}\n")
}

/// Writes a PDF with one line of Courier text per page.
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut pdf = lopdf::Document::with_version("1.5");
    let pages_id = pdf.new_object_id();
    let font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|text| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 10.into()]),
                    Operation::new("Td", vec![36.into(), 756.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            })
            .into()
        })
        .collect();

    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.save(path).unwrap();
}
