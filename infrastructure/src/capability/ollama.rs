//! Ollama `/api/chat` capability.
//!
//! Non-streaming calls return the final message content. Streaming calls
//! read the NDJSON response body through a [`LineAssembler`], forwarding
//! `content` as deltas and `thinking` as reasoning, and end with the
//! accumulated content as the result. The target schema is sent as the
//! request `format`, so the model is constrained to produce it.

use crate::transport::LineAssembler;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tribunal_application::{
    AnalysisCapability, CapabilityError, CapabilityRequest, CapabilityStream,
};
use tribunal_domain::CapabilityEvent;

/// Errors from the Ollama adapter
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("Cannot connect to Ollama at {0}")]
    Connect(String),

    #[error("Request to Ollama timed out")]
    Timeout,

    #[error("Ollama API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Ollama reported an error: {0}")]
    Model(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<OllamaError> for CapabilityError {
    fn from(e: OllamaError) -> Self {
        CapabilityError::Request(e.to_string())
    }
}

/// Connection settings for one Ollama model
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:latest".to_string(),
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// One response object (the whole body, or one NDJSON line when streaming)
#[derive(Debug, Default, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: ResponseMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallMessage>,
}

#[derive(Debug, Deserialize)]
struct ToolCallMessage {
    function: ToolCallFunction,
}

#[derive(Debug, Deserialize)]
struct ToolCallFunction {
    name: String,
}

/// Analysis capability backed by a local Ollama server
pub struct OllamaCapability {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaCapability {
    pub fn new(config: OllamaConfig) -> Result<Self, OllamaError> {
        info!(
            "Using Ollama model {} at {}",
            config.model, config.base_url
        );
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn chat_request<'a>(&'a self, request: &'a CapabilityRequest, stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            stream,
            format: request.schema.map(|schema| schema.json_schema()),
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        }
    }

    async fn post(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response, OllamaError> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        debug!("POST {} (stream: {})", url, body.stream);

        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                OllamaError::Timeout
            } else if e.is_connect() {
                OllamaError::Connect(self.config.base_url.clone())
            } else {
                OllamaError::Http(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl AnalysisCapability for OllamaCapability {
    async fn invoke(&self, request: &CapabilityRequest) -> Result<Value, CapabilityError> {
        let response = self.post(&self.chat_request(request, false)).await?;
        let chunk: ChatChunk = response.json().await.map_err(OllamaError::Http)?;
        if let Some(error) = chunk.error {
            return Err(OllamaError::Model(error).into());
        }
        Ok(Value::String(chunk.message.content))
    }

    async fn invoke_stream(
        &self,
        request: &CapabilityRequest,
    ) -> Result<CapabilityStream, CapabilityError> {
        let response = self.post(&self.chat_request(request, true)).await?;
        let (tx, stream) = CapabilityStream::channel(32);
        tokio::spawn(pump(response, tx));
        Ok(stream)
    }
}

/// Forward an NDJSON response body as capability events
async fn pump(response: reqwest::Response, tx: mpsc::Sender<CapabilityEvent>) {
    let mut body = response.bytes_stream();
    let mut lines = LineAssembler::new();
    let mut reply = Reply::default();

    while let Some(chunk) = body.next().await {
        let events: Vec<CapabilityEvent> = match chunk {
            Ok(bytes) => lines
                .push(&bytes)
                .iter()
                .flat_map(|line| reply.accept_line(line))
                .collect(),
            Err(e) => {
                warn!("Ollama stream interrupted: {}", e);
                vec![CapabilityEvent::Error(OllamaError::Http(e).to_string())]
            }
        };
        for event in events {
            let terminal = event.is_terminal();
            if tx.send(event).await.is_err() || terminal {
                return;
            }
        }
    }

    if let Some(line) = lines.finish() {
        for event in reply.accept_line(&line) {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
}

/// Accumulates one streamed reply
#[derive(Debug, Default)]
struct Reply {
    content: String,
}

impl Reply {
    fn accept_line(&mut self, line: &str) -> Vec<CapabilityEvent> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<ChatChunk>(line) {
            Ok(chunk) => self.accept(chunk),
            Err(e) => {
                debug!("Skipping undecodable Ollama line: {}", e);
                Vec::new()
            }
        }
    }

    fn accept(&mut self, chunk: ChatChunk) -> Vec<CapabilityEvent> {
        if let Some(error) = chunk.error {
            return vec![CapabilityEvent::Error(OllamaError::Model(error).to_string())];
        }

        let mut events = Vec::new();
        let message = chunk.message;
        if let Some(thinking) = message.thinking.filter(|t| !t.is_empty()) {
            events.push(CapabilityEvent::Reasoning(thinking));
        }
        events.extend(
            message
                .tool_calls
                .into_iter()
                .map(|call| CapabilityEvent::ToolUse {
                    name: call.function.name,
                }),
        );
        if !message.content.is_empty() {
            self.content.push_str(&message.content);
            events.push(CapabilityEvent::Delta(message.content));
        }
        if chunk.done {
            events.push(CapabilityEvent::Completed(Value::String(std::mem::take(
                &mut self.content,
            ))));
        }
        events
    }
}
