//! Verdict types for council voting
//!
//! A [`Verdict`] is one worker's structured FOR/AGAINST vote. A
//! [`FreeformResponse`] is the chat-mode counterpart without decision
//! semantics.

use super::parsing::{extract_json_payload, string_field};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum rationale length in characters
pub const RATIONALE_MAX_CHARS: usize = 200;

/// The side a worker votes for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stance {
    For,
    Against,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::For => "FOR",
            Stance::Against => "AGAINST",
        }
    }
}

impl std::fmt::Display for Stance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stance {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FOR" => Ok(Stance::For),
            "AGAINST" => Ok(Stance::Against),
            other => Err(DomainError::schema(format!(
                "decision must be FOR or AGAINST, got `{}`",
                other
            ))),
        }
    }
}

/// A single worker's vote
///
/// # Example
///
/// ```
/// use tribunal_domain::{Stance, Verdict};
///
/// let verdict = Verdict::new("scientist", Stance::For, "Evidence supports it.", 0.8).unwrap();
/// assert_eq!(verdict.decision, Stance::For);
/// assert!(Verdict::new("scientist", Stance::For, "", 1.2).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVerdict")]
pub struct Verdict {
    /// Identity of the worker that produced this verdict
    pub worker_id: String,
    pub decision: Stance,
    /// Reasoning, at most [`RATIONALE_MAX_CHARS`] characters
    pub rationale: String,
    /// Confidence in `[0.0, 1.0]`
    pub confidence: f64,
}

impl Verdict {
    /// Create a verdict, validating confidence and bounding the rationale
    pub fn new(
        worker_id: impl Into<String>,
        decision: Stance,
        rationale: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, DomainError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(DomainError::schema(format!(
                "confidence must be within [0.0, 1.0], got {}",
                confidence
            )));
        }
        Ok(Self {
            worker_id: worker_id.into(),
            decision,
            rationale: bound_rationale(rationale.into()),
            confidence,
        })
    }

    /// Coerce a capability result into a verdict.
    ///
    /// Accepts a JSON object or a string holding one. The `worker_id` always
    /// comes from the caller; whatever name the model reports is ignored.
    pub fn from_payload(worker_id: impl Into<String>, payload: &Value) -> Result<Self, DomainError> {
        let object = extract_json_payload(payload)?;

        let decision: Stance = string_field(&object, "decision")?.parse()?;
        let rationale = string_field(&object, "rationale")?;
        let confidence = object
            .get("confidence")
            .ok_or_else(|| DomainError::schema("missing field `confidence`"))?
            .as_f64()
            .ok_or_else(|| DomainError::schema("`confidence` must be a number"))?;

        Self::new(worker_id, decision, rationale, confidence)
    }

    pub fn is_for(&self) -> bool {
        self.decision == Stance::For
    }
}

/// Wire form of a [`Verdict`], checked before it becomes one
#[derive(Deserialize)]
struct RawVerdict {
    worker_id: String,
    decision: Stance,
    rationale: String,
    confidence: f64,
}

impl TryFrom<RawVerdict> for Verdict {
    type Error = DomainError;

    fn try_from(raw: RawVerdict) -> Result<Self, Self::Error> {
        if raw.rationale.chars().count() > RATIONALE_MAX_CHARS {
            return Err(DomainError::schema(format!(
                "rationale exceeds {} characters",
                RATIONALE_MAX_CHARS
            )));
        }
        Verdict::new(raw.worker_id, raw.decision, raw.rationale, raw.confidence)
    }
}

/// A worker's open-ended answer in chat mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeformResponse {
    pub worker_id: String,
    pub text: String,
}

impl FreeformResponse {
    pub fn new(worker_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            text: text.into(),
        }
    }

    /// Coerce a capability result into a response.
    ///
    /// A plain (non-JSON) string is taken as the answer itself.
    pub fn from_payload(worker_id: impl Into<String>, payload: &Value) -> Result<Self, DomainError> {
        let structured = extract_json_payload(payload)
            .ok()
            .and_then(|object| string_field(&object, "text").ok());
        let text = match structured {
            Some(text) => text,
            None => payload
                .as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| DomainError::schema("response must carry a `text` field"))?,
        };
        if text.trim().is_empty() {
            return Err(DomainError::schema("response text is empty"));
        }
        Ok(Self::new(worker_id, text))
    }
}

fn bound_rationale(rationale: String) -> String {
    let trimmed = rationale.trim();
    match trimmed.char_indices().nth(RATIONALE_MAX_CHARS) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    }
}
