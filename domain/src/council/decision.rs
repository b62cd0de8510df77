//! Aggregated results of a council run.

use super::parsing::{extract_json_payload, string_field, string_list_field};
use super::tally::{Outcome, VoteTally, tally};
use super::verdict::{FreeformResponse, Verdict};
use crate::core::error::DomainError;
use crate::orchestration::mode::ChatFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder summary attached when no synthesis call is made
pub const PLACEHOLDER_SUMMARY: &str = "The council's verdicts were combined by majority vote.";

/// Narrative enrichment written by the judge.
///
/// Never influences the vote outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub summary: String,
    pub key_points: Vec<String>,
    pub recommendation: String,
}

impl Synthesis {
    pub fn new(
        summary: impl Into<String>,
        key_points: Vec<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            key_points,
            recommendation: recommendation.into(),
        }
    }

    /// The fixed narrative used by the lightweight path
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_SUMMARY, Vec::new(), "")
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }

    /// Coerce a capability result into a synthesis
    pub fn from_payload(payload: &Value) -> Result<Self, DomainError> {
        let object = extract_json_payload(payload)?;
        Ok(Self {
            summary: string_field(&object, "summary")?,
            key_points: string_list_field(&object, "key_points")?,
            recommendation: string_field(&object, "recommendation")?,
        })
    }

    /// Render as one block of text: summary, key points, recommendation
    pub fn to_text(&self) -> String {
        let mut text = self.summary.clone();
        if !self.key_points.is_empty() {
            text.push_str("\n\nKey points:");
            for point in &self.key_points {
                text.push_str(&format!("\n- {}", point));
            }
        }
        if !self.recommendation.is_empty() {
            text.push_str(&format!("\n\nRecommendation:\n{}", self.recommendation));
        }
        text
    }
}

/// The council's decision: outcome, counts, every verdict, optional narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecision")]
pub struct Decision {
    pub outcome: Outcome,
    pub vote_tally: VoteTally,
    /// One per worker, in worker order
    pub verdicts: Vec<Verdict>,
    pub narrative: Option<Synthesis>,
}

impl Decision {
    /// Tally the verdicts and build a decision.
    ///
    /// Fails when fewer than `min_verdicts` verdicts are supplied; zero
    /// verdicts is always an error.
    pub fn tallied(verdicts: Vec<Verdict>, min_verdicts: usize) -> Result<Self, DomainError> {
        let expected = min_verdicts.max(1);
        if verdicts.len() < expected {
            return Err(DomainError::NotEnoughVerdicts {
                expected,
                actual: verdicts.len(),
            });
        }
        let vote_tally = tally(&verdicts);
        Ok(Self {
            outcome: vote_tally.outcome(),
            vote_tally,
            verdicts,
            narrative: None,
        })
    }

    /// Attach a narrative; outcome and tally stay untouched
    pub fn with_narrative(mut self, narrative: Synthesis) -> Self {
        self.narrative = Some(narrative);
        self
    }

    pub fn is_unanimous(&self) -> bool {
        self.vote_tally.for_count == self.vote_tally.total()
            || self.vote_tally.against_count == self.vote_tally.total()
    }
}

/// Wire form of a [`Decision`]; the outcome and counts must agree with the
/// verdicts they came from
#[derive(Deserialize)]
struct RawDecision {
    outcome: Outcome,
    vote_tally: VoteTally,
    verdicts: Vec<Verdict>,
    narrative: Option<Synthesis>,
}

impl TryFrom<RawDecision> for Decision {
    type Error = DomainError;

    fn try_from(raw: RawDecision) -> Result<Self, Self::Error> {
        let mut decision = Decision::tallied(raw.verdicts, 1)?;
        if raw.vote_tally != decision.vote_tally {
            return Err(DomainError::schema(format!(
                "vote_tally {} FOR / {} AGAINST does not match the verdicts",
                raw.vote_tally.for_count, raw.vote_tally.against_count
            )));
        }
        if raw.outcome != decision.outcome {
            return Err(DomainError::schema(format!(
                "outcome {} contradicts a tally of {} FOR / {} AGAINST",
                raw.outcome.as_str(),
                decision.vote_tally.for_count,
                decision.vote_tally.against_count
            )));
        }
        decision.narrative = raw.narrative;
        Ok(decision)
    }
}

/// How the judge phrases a chat-mode answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum ChatNarrative {
    /// Multi-section narrative
    Explicit(Synthesis),
    /// One fused natural-language answer
    Natural { answer: String },
}

impl ChatNarrative {
    /// Coerce a capability result into the narrative for `format`
    pub fn from_payload(format: ChatFormat, payload: &Value) -> Result<Self, DomainError> {
        match format {
            ChatFormat::Explicit => Synthesis::from_payload(payload).map(ChatNarrative::Explicit),
            ChatFormat::Natural => {
                let answer = match extract_json_payload(payload) {
                    Ok(object) => string_field(&object, "answer")?,
                    Err(_) => payload
                        .as_str()
                        .map(|s| s.trim().to_string())
                        .ok_or_else(|| DomainError::schema("missing field `answer`"))?,
                };
                if answer.is_empty() {
                    return Err(DomainError::schema("answer is empty"));
                }
                Ok(ChatNarrative::Natural { answer })
            }
        }
    }

    pub fn format(&self) -> ChatFormat {
        match self {
            ChatNarrative::Explicit(_) => ChatFormat::Explicit,
            ChatNarrative::Natural { .. } => ChatFormat::Natural,
        }
    }
}

/// Chat-mode aggregation: every response plus the judge's narrative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResult {
    pub responses: Vec<FreeformResponse>,
    pub narrative: ChatNarrative,
}
