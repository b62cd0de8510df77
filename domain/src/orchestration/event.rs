//! Council run events.
//!
//! [`Event`] is the unit of the streamed progress protocol: the orchestrator
//! emits it, the frame encoder writes it as one JSON line, and the stream
//! decoder on the consuming side rebuilds it.
//!
//! # Ordering
//!
//! ```text
//! worker_start(A) → content/reasoning/tool_use* → worker_verdict(A) → worker_complete(A)
//! worker_start(B) → ...                                              → worker_complete(B)
//! judge_start → judge_complete → final
//! ```
//!
//! Blocks never interleave. `error` may appear anywhere and ends the run
//! unless the failure policy is lenient.

use crate::council::{ChatResult, Decision, FreeformResponse, Verdict};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    WorkerStart { worker_id: String },
    /// Streamed partial text ("thinking")
    Content { text: String },
    /// Secondary reasoning channel
    Reasoning { text: String },
    ToolUse { name: String },
    WorkerVerdict { verdict: Verdict },
    WorkerResponse { response: FreeformResponse },
    WorkerComplete { worker_id: String },
    JudgeStart,
    JudgeComplete,
    Final { decision: Decision },
    ChatResult { result: ChatResult },
    Error { message: String },
    /// A transport line that did not decode into an event
    Text { text: String },
}

impl Event {
    pub fn content(text: impl Into<String>) -> Self {
        Event::Content { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
        }
    }

    /// Wire name of this variant
    pub fn kind(&self) -> &'static str {
        match self {
            Event::WorkerStart { .. } => "worker_start",
            Event::Content { .. } => "content",
            Event::Reasoning { .. } => "reasoning",
            Event::ToolUse { .. } => "tool_use",
            Event::WorkerVerdict { .. } => "worker_verdict",
            Event::WorkerResponse { .. } => "worker_response",
            Event::WorkerComplete { .. } => "worker_complete",
            Event::JudgeStart => "judge_start",
            Event::JudgeComplete => "judge_complete",
            Event::Final { .. } => "final",
            Event::ChatResult { .. } => "chat_result",
            Event::Error { .. } => "error",
            Event::Text { .. } => "text",
        }
    }

    /// Worker identity carried by this event, if any
    pub fn worker_id(&self) -> Option<&str> {
        match self {
            Event::WorkerStart { worker_id } | Event::WorkerComplete { worker_id } => {
                Some(worker_id)
            }
            Event::WorkerVerdict { verdict } => Some(&verdict.worker_id),
            Event::WorkerResponse { response } => Some(&response.worker_id),
            _ => None,
        }
    }

    /// True for the single result event inside a worker block
    pub fn is_worker_result(&self) -> bool {
        matches!(self, Event::WorkerVerdict { .. } | Event::WorkerResponse { .. })
    }

    /// True for events that end a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::Final { .. } | Event::ChatResult { .. } | Event::Error { .. }
        )
    }

    /// Message of an `error` event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Event::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Streamed text, if this is a content-like event
    pub fn text(&self) -> Option<&str> {
        match self {
            Event::Content { text } | Event::Reasoning { text } | Event::Text { text } => {
                Some(text)
            }
            _ => None,
        }
    }
}
