//! Deterministic offline capability.
//!
//! Streams a few lines of canned "thinking" and returns a result shaped by
//! the requested schema, so the whole pipeline runs without a model. The
//! vote is derived from the request text: the same question and persona
//! always vote the same way.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;
use tribunal_application::{
    AnalysisCapability, CapabilityError, CapabilityRequest, CapabilityStream,
};
use tribunal_domain::{CapabilityEvent, OutputSchema};

const THINKING: [&str; 3] = [
    "Reading the question carefully. ",
    "Weighing it from my standpoint. ",
    "Settling on a position.",
];

/// Offline stand-in for a real model
#[derive(Debug, Clone, Default)]
pub struct MockCapability {
    /// Pause between streamed chunks
    delay: Duration,
}

impl MockCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn respond(request: &CapabilityRequest) -> Value {
        let seed = seed(request);
        match request.schema {
            Some(OutputSchema::Verdict) | None => {
                let (decision, leaning) = if seed % 2 == 0 {
                    ("FOR", "the benefits outweigh the risks")
                } else {
                    ("AGAINST", "the risks outweigh the benefits")
                };
                json!({
                    "decision": decision,
                    "rationale": format!("Offline assessment: {}.", leaning),
                    "confidence": 0.5 + (seed % 50) as f64 / 100.0,
                })
            }
            Some(OutputSchema::Response) => json!({
                "text": "Offline answer: this depends on context; consider the trade-offs \
                         from each viewpoint before committing.",
            }),
            Some(OutputSchema::Synthesis) => json!({
                "summary": "Offline synthesis of the council's positions.",
                "key_points": [
                    "Each member reasoned from a different standpoint",
                    "The vote decides the outcome",
                ],
                "recommendation": "Run again with a real model for a substantive analysis.",
            }),
            Some(OutputSchema::Answer) => json!({
                "answer": "Offline answer: the council sees merit and risk in equal measure; \
                           weigh both before deciding.",
            }),
        }
    }
}

/// Stable hash of the request text
fn seed(request: &CapabilityRequest) -> u64 {
    request
        .system_prompt
        .bytes()
        .chain(request.prompt.bytes())
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
}

#[async_trait]
impl AnalysisCapability for MockCapability {
    async fn invoke(&self, request: &CapabilityRequest) -> Result<Value, CapabilityError> {
        tokio::time::sleep(self.delay).await;
        Ok(Self::respond(request))
    }

    async fn invoke_stream(
        &self,
        request: &CapabilityRequest,
    ) -> Result<CapabilityStream, CapabilityError> {
        let result = Self::respond(request);
        let delay = self.delay;
        let (tx, stream) = CapabilityStream::channel(8);

        tokio::spawn(async move {
            let mut events = vec![CapabilityEvent::Marker("init".to_string())];
            events.extend(THINKING.iter().map(|t| CapabilityEvent::Delta(t.to_string())));
            events.push(CapabilityEvent::Marker("cycle_complete".to_string()));
            events.push(CapabilityEvent::Completed(result));

            for event in events {
                if tx.send(event).await.is_err() {
                    debug!("Mock stream receiver dropped");
                    return;
                }
                tokio::time::sleep(delay).await;
            }
        });

        Ok(stream)
    }
}
