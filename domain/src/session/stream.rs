//! Streaming events produced by an analysis capability.
//!
//! [`CapabilityEvent`] is what a capability's native stream is mapped to
//! before a worker turns it into council [`Event`](crate::Event)s:
//!
//! | CapabilityEvent | Worker emits |
//! |-----------------|--------------|
//! | `Delta` | `Event::Content` |
//! | `Reasoning` | `Event::Reasoning` |
//! | `ToolUse` | `Event::ToolUse` |
//! | `Marker` | nothing |
//! | `Completed` | `Event::WorkerVerdict` / `Event::WorkerResponse` |
//! | `Error` | stream failure |

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityEvent {
    /// A text chunk from the model
    Delta(String),
    /// Interleaved reasoning text
    Reasoning(String),
    /// The model started using a tool
    ToolUse { name: String },
    /// Lifecycle marker (init, loop start, cycle complete, ...)
    Marker(String),
    /// The terminal structured result; a JSON object or text containing one
    Completed(Value),
    /// An error that occurred during streaming
    Error(String),
}

impl CapabilityEvent {
    /// Returns the text content if this is a Delta or Reasoning event.
    pub fn text(&self) -> Option<&str> {
        match self {
            CapabilityEvent::Delta(s) | CapabilityEvent::Reasoning(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CapabilityEvent::Completed(_) | CapabilityEvent::Error(_))
    }
}
