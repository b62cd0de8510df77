//! Invocation payload accepted at the process boundary.

use super::error::DomainError;
use super::question::Question;
use crate::orchestration::mode::{ChatFormat, RunMode};
use serde::{Deserialize, Serialize};

/// `{question, mode, format}` as sent by a caller.
///
/// `mode` defaults to `judge`; `format` defaults to `explicit` and only
/// matters in chat mode.
///
/// ```
/// use tribunal_domain::{InvocationPayload, RunMode, ChatFormat};
///
/// let payload = InvocationPayload::from_json(r#"{"question": "Adopt AI?"}"#).unwrap();
/// assert_eq!(payload.mode, RunMode::Judge);
/// assert_eq!(payload.format, ChatFormat::Explicit);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationPayload {
    pub question: Question,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub format: ChatFormat,
}

impl InvocationPayload {
    /// Judge-mode payload for a question
    pub fn judge(question: Question) -> Self {
        Self {
            question,
            mode: RunMode::Judge,
            format: ChatFormat::default(),
        }
    }

    /// Chat-mode payload for a question
    pub fn chat(question: Question, format: ChatFormat) -> Self {
        Self {
            question,
            mode: RunMode::Chat,
            format,
        }
    }

    /// Parse a JSON payload
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw).map_err(|e| DomainError::InvalidPayload(e.to_string()))
    }
}
