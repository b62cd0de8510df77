//! Worker: one council member.
//!
//! A worker wraps the analysis capability with a persona. It issues one
//! call per question and coerces the result into a [`Verdict`] (judge mode)
//! or a [`FreeformResponse`] (chat mode). The streaming variants forward
//! partial output as [`Event`]s and end with exactly one result event, or
//! with an error.

use crate::config::DEFAULT_TIMEOUT;
use crate::ports::capability::{
    AnalysisCapability, CapabilityError, CapabilityRequest, CapabilityStream,
};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};
use tribunal_domain::{
    CapabilityEvent, Event, FreeformResponse, OutputSchema, Persona, PromptTemplate, Question,
    Verdict,
};

/// A worker's event stream.
///
/// Yields partial output, then one `WorkerVerdict`/`WorkerResponse`, then
/// ends. A failure is yielded as the last item.
pub type WorkerEventStream = BoxStream<'static, Result<Event, CapabilityError>>;

/// What the worker was asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    Verdict,
    Response,
}

impl Expected {
    fn schema(self) -> OutputSchema {
        match self {
            Expected::Verdict => OutputSchema::Verdict,
            Expected::Response => OutputSchema::Response,
        }
    }

    fn prompt(self, question: &Question) -> String {
        match self {
            Expected::Verdict => PromptTemplate::analyze_prompt(question.content()),
            Expected::Response => PromptTemplate::respond_prompt(question.content()),
        }
    }

    fn coerce(self, worker_id: &str, payload: &Value) -> Result<Event, CapabilityError> {
        Ok(match self {
            Expected::Verdict => Event::WorkerVerdict {
                verdict: Verdict::from_payload(worker_id, payload)?,
            },
            Expected::Response => Event::WorkerResponse {
                response: FreeformResponse::from_payload(worker_id, payload)?,
            },
        })
    }
}

/// One council member
#[derive(Clone)]
pub struct Worker {
    persona: Persona,
    system_prompt: String,
    capability: Arc<dyn AnalysisCapability>,
    timeout: Duration,
}

impl Worker {
    pub fn new(persona: Persona, capability: Arc<dyn AnalysisCapability>) -> Self {
        let system_prompt = PromptTemplate::worker_system(&persona);
        Self {
            persona,
            system_prompt,
            capability,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        &self.persona.id
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Ask for a vote on `question`
    pub async fn analyze(&self, question: &Question) -> Result<Verdict, CapabilityError> {
        let payload = self.invoke(self.request(Expected::Verdict, question)).await?;
        Ok(Verdict::from_payload(self.id(), &payload)?)
    }

    /// Ask for an open answer to `question`
    pub async fn respond(&self, question: &Question) -> Result<FreeformResponse, CapabilityError> {
        let payload = self.invoke(self.request(Expected::Response, question)).await?;
        Ok(FreeformResponse::from_payload(self.id(), &payload)?)
    }

    /// Streaming variant of [`Worker::analyze`]
    ///
    /// The call starts when the stream is first polled.
    pub fn analyze_stream(&self, question: &Question) -> WorkerEventStream {
        self.stream(Expected::Verdict, question)
    }

    /// Streaming variant of [`Worker::respond`]
    pub fn respond_stream(&self, question: &Question) -> WorkerEventStream {
        self.stream(Expected::Response, question)
    }

    fn request(&self, expected: Expected, question: &Question) -> CapabilityRequest {
        CapabilityRequest::new(expected.prompt(question), self.system_prompt.clone())
            .with_schema(expected.schema())
    }

    async fn invoke(&self, request: CapabilityRequest) -> Result<Value, CapabilityError> {
        debug!(worker = %self.id(), "Invoking capability");
        match tokio::time::timeout(self.timeout, self.capability.invoke(&request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(worker = %self.id(), "Capability call timed out after {:?}", self.timeout);
                Err(CapabilityError::Timeout(self.timeout))
            }
        }
    }

    fn stream(&self, expected: Expected, question: &Question) -> WorkerEventStream {
        let state = StreamState {
            worker_id: self.id().to_string(),
            expected,
            timeout: self.timeout,
            deadline: None,
            source: Source::Pending {
                capability: Arc::clone(&self.capability),
                request: self.request(expected, question),
            },
        };

        stream::unfold(state, |mut state| async move {
            let item = state.advance().await?;
            Some((item, state))
        })
        .boxed()
    }
}

enum Source {
    Pending {
        capability: Arc<dyn AnalysisCapability>,
        request: CapabilityRequest,
    },
    Open(CapabilityStream),
    Finished,
}

struct StreamState {
    worker_id: String,
    expected: Expected,
    timeout: Duration,
    /// One deadline covers opening the stream and reading all of it
    deadline: Option<Instant>,
    source: Source,
}

impl StreamState {
    /// Next worker event; `None` once the stream is over
    async fn advance(&mut self) -> Option<Result<Event, CapabilityError>> {
        let timeout = self.timeout;
        let deadline = *self.deadline.get_or_insert_with(|| deadline_after(timeout));

        loop {
            match std::mem::replace(&mut self.source, Source::Finished) {
                Source::Finished => return None,
                Source::Pending {
                    capability,
                    request,
                } => {
                    debug!(worker = %self.worker_id, "Opening capability stream");
                    match tokio::time::timeout_at(deadline, capability.invoke_stream(&request)).await
                    {
                        Ok(Ok(stream)) => self.source = Source::Open(stream),
                        Ok(Err(e)) => return Some(Err(e)),
                        Err(_) => return Some(Err(self.timed_out())),
                    }
                }
                Source::Open(mut stream) => {
                    let event = match tokio::time::timeout_at(deadline, stream.next()).await {
                        Ok(Some(event)) => event,
                        Ok(None) => {
                            return Some(Err(CapabilityError::MissingResult {
                                worker_id: self.worker_id.clone(),
                            }));
                        }
                        Err(_) => return Some(Err(self.timed_out())),
                    };

                    let forwarded = match event {
                        CapabilityEvent::Delta(text) if !text.is_empty() => {
                            Some(Event::Content { text })
                        }
                        CapabilityEvent::Reasoning(text) if !text.is_empty() => {
                            Some(Event::Reasoning { text })
                        }
                        CapabilityEvent::ToolUse { name } => Some(Event::ToolUse { name }),
                        CapabilityEvent::Delta(_) | CapabilityEvent::Reasoning(_) => None,
                        CapabilityEvent::Marker(marker) => {
                            trace!(worker = %self.worker_id, marker = %marker, "Dropping marker");
                            None
                        }
                        // Nothing is read past the result; the source stays finished
                        CapabilityEvent::Completed(payload) => {
                            return Some(self.expected.coerce(&self.worker_id, &payload));
                        }
                        CapabilityEvent::Error(message) => {
                            return Some(Err(CapabilityError::Request(message)));
                        }
                    };

                    self.source = Source::Open(stream);
                    if let Some(event) = forwarded {
                        return Some(Ok(event));
                    }
                }
            }
        }
    }

    fn timed_out(&self) -> CapabilityError {
        warn!(worker = %self.worker_id, "Capability stream timed out after {:?}", self.timeout);
        CapabilityError::Timeout(self.timeout)
    }
}

/// Stand-in deadline for timeouts too large to add to `Instant::now()`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}
