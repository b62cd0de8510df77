//! Target output schemas handed to the capability.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The shape a capability call is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSchema {
    /// A worker's vote
    Verdict,
    /// A worker's chat answer
    Response,
    /// The judge's multi-section narrative
    Synthesis,
    /// The judge's single fused answer
    Answer,
}

impl OutputSchema {
    pub fn name(&self) -> &'static str {
        match self {
            OutputSchema::Verdict => "verdict",
            OutputSchema::Response => "response",
            OutputSchema::Synthesis => "synthesis",
            OutputSchema::Answer => "answer",
        }
    }

    /// JSON Schema document for this shape
    pub fn json_schema(&self) -> Value {
        match self {
            OutputSchema::Verdict => json!({
                "type": "object",
                "properties": {
                    "decision": {"type": "string", "enum": ["FOR", "AGAINST"]},
                    "rationale": {"type": "string", "maxLength": 200},
                    "confidence": {"type": "number", "minimum": 0.0, "maximum": 1.0}
                },
                "required": ["decision", "rationale", "confidence"]
            }),
            OutputSchema::Response => json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
            OutputSchema::Synthesis => json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string"},
                    "key_points": {"type": "array", "items": {"type": "string"}},
                    "recommendation": {"type": "string"}
                },
                "required": ["summary", "key_points", "recommendation"]
            }),
            OutputSchema::Answer => json!({
                "type": "object",
                "properties": {"answer": {"type": "string"}},
                "required": ["answer"]
            }),
        }
    }
}
