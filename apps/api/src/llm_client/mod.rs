//! Completion Client: the single point of entry for all language model calls.
//!
//! No other module may talk to the model backend directly. Callers depend on
//! the `CompletionBackend` trait; `OllamaClient` is the production backend.
//!
//! One attempt per call: no retries and no caching. A failed call surfaces as
//! a `TaskError` and the user re-triggers the action.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::TaskError;
use crate::prompts::{ChatMessage, StructuredRequest};

/// The model backend seam. Carried in `AppState` as `Arc<dyn CompletionBackend>`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends the request and returns the reply text, unmodified.
    async fn complete(&self, request: &StructuredRequest) -> Result<String, TaskError>;

    /// Model identifier, for logs and the health endpoint.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Client for a local Ollama server's `/api/chat` endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    async fn complete(&self, request: &StructuredRequest) -> Result<String, TaskError> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            stream: false,
        };
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            // Ollama reports failures as {"error": "..."}
            let message = serde_json::from_str::<OllamaError>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            warn!("Model backend returned {status}: {message}");
            return Err(TaskError::BackendUnavailable(format!(
                "status {}: {message}",
                status.as_u16()
            )));
        }

        let reply = parse_chat_reply(&text)?;
        debug!(
            "Completion succeeded in {}ms: prompt_tokens={:?}, output_tokens={:?}",
            started.elapsed().as_millis(),
            reply.prompt_eval_count,
            reply.eval_count
        );
        reply_text(reply)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn classify_transport_error(e: reqwest::Error) -> TaskError {
    if e.is_timeout() {
        TaskError::BackendTimeout
    } else if e.is_decode() {
        TaskError::BackendMalformedReply(e.to_string())
    } else {
        TaskError::BackendUnavailable(e.to_string())
    }
}

fn parse_chat_reply(body: &str) -> Result<ChatResponse, TaskError> {
    serde_json::from_str(body).map_err(|e| TaskError::BackendMalformedReply(e.to_string()))
}

/// A reply with no message or only whitespace is malformed; anything else is
/// passed through byte for byte.
fn reply_text(reply: ChatResponse) -> Result<String, TaskError> {
    match reply.message {
        Some(m) if !m.content.trim().is_empty() => Ok(m.content),
        Some(_) => Err(TaskError::BackendMalformedReply(
            "reply content is empty".to_string(),
        )),
        None => Err(TaskError::BackendMalformedReply(
            "reply has no message".to_string(),
        )),
    }
}
