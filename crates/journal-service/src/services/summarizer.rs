//! Entry summarization.
//!
//! When an LLM API key is configured, summaries come from an
//! OpenAI-compatible chat completions endpoint. Any failure there, or no
//! key at all, falls back to an extractive summary (the first few
//! sentences), so summarization degrades instead of erroring.

use crate::observability::metrics::record_summarization;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::instrument;

/// Timeout for a single LLM request.
const LLM_TIMEOUT_SECONDS: u64 = 30;

/// Sampling temperature for summaries. Low, to keep them factual.
const LLM_TEMPERATURE: f32 = 0.2;

/// Number of sentences the extractive fallback keeps.
const FALLBACK_SENTENCES: usize = 3;

const SYSTEM_PROMPT: &str =
    "You summarize personal journal entries in 3-4 sentences, in a neutral tone, \
     preserving the writer's key events and feelings.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Summarizer with LLM primary path and extractive fallback.
pub struct Summarizer {
    http_client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl Summarizer {
    /// Create a summarizer. With `api_key: None` every call uses the
    /// extractive fallback.
    pub fn new(api_key: Option<String>, api_url: String, model: String, max_tokens: u32) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LLM_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "journal.summarizer", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http_client,
            api_key,
            api_url,
            model,
            max_tokens,
        }
    }

    /// Summarize a journal entry body. Never fails.
    #[instrument(skip_all)]
    pub async fn summarize(&self, text: &str) -> String {
        let start = Instant::now();

        if let Some(api_key) = &self.api_key {
            match self.summarize_llm(api_key, text).await {
                Ok(summary) => {
                    record_summarization("llm", start.elapsed());
                    return summary;
                }
                Err(e) => {
                    tracing::warn!(
                        target: "journal.summarizer",
                        error = %e,
                        "LLM summarization failed, using extractive fallback"
                    );
                }
            }
        }

        let summary = first_sentences(text, FALLBACK_SENTENCES);
        record_summarization("fallback", start.elapsed());
        summary
    }

    async fn summarize_llm(&self, api_key: &str, text: &str) -> Result<String, String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: LLM_TEMPERATURE,
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("LLM request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("LLM endpoint returned {}", response.status()));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse LLM response: {}", e))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| "LLM response contained no completion".to_string())?;

        Ok(content)
    }
}

/// Extract the first `count` sentences of a text.
///
/// Sentences end at '.', '!' or '?'. A text with no terminator at all is
/// returned whole.
fn first_sentences(text: &str, count: usize) -> String {
    let trimmed = text.trim();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in trimmed.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
            if sentences.len() == count {
                break;
            }
        }
    }

    if sentences.len() < count {
        let tail = current.trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
    }

    sentences.join(" ")
}
