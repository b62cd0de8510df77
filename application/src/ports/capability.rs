//! Analysis capability port
//!
//! Defines the interface to the opaque analysis service (a language model
//! behind some vendor protocol). The core depends only on this shape.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tribunal_domain::{CapabilityEvent, DomainError, OutputSchema};

/// Errors that can occur during capability calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid result: {0}")]
    Schema(String),

    #[error("Stream for {worker_id} ended without a result")]
    MissingResult { worker_id: String },
}

impl From<DomainError> for CapabilityError {
    fn from(e: DomainError) -> Self {
        CapabilityError::Schema(e.to_string())
    }
}

/// One capability call: prompt, system prompt and the target schema
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub schema: Option<OutputSchema>,
}

impl CapabilityRequest {
    pub fn new(prompt: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: system_prompt.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Handle for receiving streaming events from a capability call.
///
/// Wraps an `mpsc::Receiver<CapabilityEvent>`; the stream ends when every
/// sender is dropped.
pub struct CapabilityStream {
    receiver: mpsc::Receiver<CapabilityEvent>,
}

impl CapabilityStream {
    pub fn new(receiver: mpsc::Receiver<CapabilityEvent>) -> Self {
        Self { receiver }
    }

    /// Create a connected sender / stream pair
    pub fn channel(buffer: usize) -> (mpsc::Sender<CapabilityEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx))
    }

    /// A finished stream that replays `events`
    pub fn from_events(events: Vec<CapabilityEvent>) -> Self {
        let (tx, stream) = Self::channel(events.len());
        for event in events {
            // Capacity covers every event, so this cannot fail
            let _ = tx.try_send(event);
        }
        stream
    }

    /// Receive the next event; `None` once the stream has ended
    pub async fn next(&mut self) -> Option<CapabilityEvent> {
        self.receiver.recv().await
    }

    /// Consume the stream and return the terminal result.
    pub async fn collect_result(mut self) -> Result<Value, CapabilityError> {
        while let Some(event) = self.next().await {
            match event {
                CapabilityEvent::Completed(value) => return Ok(value),
                CapabilityEvent::Error(e) => return Err(CapabilityError::Request(e)),
                _ => {}
            }
        }
        Err(CapabilityError::Request(
            "stream ended without a result".to_string(),
        ))
    }
}

/// The opaque analysis capability
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait AnalysisCapability: Send + Sync {
    /// Run one call and return the structured result
    async fn invoke(&self, request: &CapabilityRequest) -> Result<Value, CapabilityError>;

    /// Run one call and stream partial output followed by the result.
    ///
    /// Default implementation calls `invoke()` and wraps the result in a
    /// single `Completed` event.
    async fn invoke_stream(
        &self,
        request: &CapabilityRequest,
    ) -> Result<CapabilityStream, CapabilityError> {
        let result = self.invoke(request).await?;
        Ok(CapabilityStream::from_events(vec![
            CapabilityEvent::Completed(result),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedCapability;

    #[async_trait]
    impl AnalysisCapability for FixedCapability {
        async fn invoke(&self, _request: &CapabilityRequest) -> Result<Value, CapabilityError> {
            Ok(json!({"text": "fixed"}))
        }
    }

    #[tokio::test]
    async fn default_stream_wraps_invoke() {
        let request = CapabilityRequest::new("q", "s").with_schema(OutputSchema::Response);
        let mut stream = FixedCapability.invoke_stream(&request).await.unwrap();
        assert_eq!(
            stream.next().await,
            Some(CapabilityEvent::Completed(json!({"text": "fixed"})))
        );
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn collect_result_skips_partial_output() {
        let stream = CapabilityStream::from_events(vec![
            CapabilityEvent::Marker("init".into()),
            CapabilityEvent::Delta("thinking".into()),
            CapabilityEvent::Completed(json!({"ok": true})),
        ]);
        assert_eq!(stream.collect_result().await.unwrap(), json!({"ok": true}));
    }

    #[tokio::test]
    async fn collect_result_reports_errors() {
        let stream = CapabilityStream::from_events(vec![CapabilityEvent::Error("boom".into())]);
        assert_eq!(
            stream.collect_result().await,
            Err(CapabilityError::Request("boom".into()))
        );

        let empty = CapabilityStream::from_events(vec![]);
        assert!(empty.collect_result().await.is_err());
    }

    #[test]
    fn domain_errors_become_schema_errors() {
        let err: CapabilityError = DomainError::schema("bad").into();
        assert!(matches!(err, CapabilityError::Schema(_)));
    }
}
