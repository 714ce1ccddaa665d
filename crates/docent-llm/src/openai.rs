//! OpenAI-compatible streaming backend.
//!
//! Speaks the `/chat/completions` SSE protocol shared by OpenAI, Groq
//! and most self-hosted inference servers. The response stream is
//! decoded line by line into [`StreamEvent`]s; the producer task stops
//! as soon as the consumer hangs up.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use docent_chat::error::ChatError;
use docent_chat::stream::{GenerationBackend, StreamEvent, STREAM_BUFFER};
use docent_core::config::LlmConfig;
use docent_core::error::DocentError;

/// Join a base URL and the chat completions path without doubling
/// slashes when the configured base carries a trailing one.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// One decoded SSE line.
#[derive(Debug, PartialEq)]
enum SseLine {
    /// A content fragment from the delta payload.
    Delta(String),
    /// The `[DONE]` terminator.
    Done,
    /// Anything else: blank lines, comments, role-only deltas,
    /// usage records, unparseable payloads.
    Ignore,
}

fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Ignore;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    let Ok(value) = serde_json::from_str::<Value>(data) else {
        return SseLine::Ignore;
    };
    match value["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => SseLine::Delta(content.to_string()),
        _ => SseLine::Ignore,
    }
}

/// Streaming backend for any OpenAI-compatible chat completions API.
pub struct OpenAiCompatibleBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        temperature: Option<f32>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            temperature,
        }
    }

    /// Build a backend from config, reading the API key from the
    /// environment variable the config names.
    pub fn from_config(config: &LlmConfig) -> Result<Self, DocentError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            DocentError::Config(format!(
                "API key environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Ok(Self::new(
            config.base_url.clone(),
            api_key,
            config.model.clone(),
            Some(config.temperature),
        ))
    }
}

// Manual impl: the API key must never reach logs.
impl std::fmt::Debug for OpenAiCompatibleBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[async_trait]
impl GenerationBackend for OpenAiCompatibleBackend {
    async fn generate(&self, prompt: &str) -> Result<mpsc::Receiver<StreamEvent>, ChatError> {
        let url = chat_completions_url(&self.base_url);
        let request = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Generation(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Generation(format!(
                "chat completions request failed: HTTP {} {}",
                status, body
            )));
        }

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(error = %e, "answer stream interrupted");
                        let _ = tx.send(StreamEvent::Failure(e.to_string())).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = buffer.find('\n') {
                    let line: String = buffer.drain(..=newline).collect();
                    match parse_sse_line(&line) {
                        SseLine::Delta(content) => {
                            if tx.send(StreamEvent::Content(content)).await.is_err() {
                                // Consumer dropped the stream; stop reading.
                                debug!("answer stream cancelled by consumer");
                                return;
                            }
                        }
                        SseLine::Done => return,
                        SseLine::Ignore => {}
                    }
                }
            }
        });

        Ok(rx)
    }
}
