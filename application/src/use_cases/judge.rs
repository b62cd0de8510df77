//! Judge: aggregates worker results.
//!
//! The outcome of a vote is always the majority tally. When synthesis is
//! enabled the judge additionally asks the capability for a narrative, but
//! nothing the narrative says can change the tally or the outcome.

use crate::config::DEFAULT_TIMEOUT;
use crate::ports::capability::{AnalysisCapability, CapabilityError, CapabilityRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use tribunal_domain::{
    ChatFormat, ChatNarrative, ChatResult, Decision, DomainError, FreeformResponse, OutputSchema,
    PromptTemplate, Question, Synthesis, Verdict,
};

/// Errors that can occur while judging
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("Cannot aggregate: {0}")]
    Aggregation(DomainError),

    /// The narrative call failed. `decision` holds the tallied decision with
    /// the placeholder narrative so callers may fall back to it.
    #[error("Synthesis failed: {source}")]
    Synthesis {
        decision: Box<Decision>,
        #[source]
        source: CapabilityError,
    },

    #[error("Chat synthesis failed: {0}")]
    Chat(#[source] CapabilityError),
}

impl JudgeError {
    /// The tallied decision carried by a synthesis failure
    pub fn into_decision(self) -> Option<Decision> {
        match self {
            JudgeError::Synthesis { decision, .. } => Some(*decision),
            _ => None,
        }
    }

    pub fn is_aggregation_input(&self) -> bool {
        matches!(self, JudgeError::Aggregation(e) if e.is_aggregation_input())
    }
}

/// The council's judge
#[derive(Clone)]
pub struct Judge {
    capability: Arc<dyn AnalysisCapability>,
    timeout: Duration,
    min_verdicts: usize,
}

impl Judge {
    pub fn new(capability: Arc<dyn AnalysisCapability>) -> Self {
        Self {
            capability,
            timeout: DEFAULT_TIMEOUT,
            min_verdicts: 1,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fewest worker results the judge accepts (never below one)
    pub fn with_min_verdicts(mut self, min_verdicts: usize) -> Self {
        self.min_verdicts = min_verdicts.max(1);
        self
    }

    /// Tally the verdicts into a decision with the placeholder narrative.
    pub fn decide(&self, verdicts: Vec<Verdict>) -> Result<Decision, JudgeError> {
        let decision =
            Decision::tallied(verdicts, self.min_verdicts).map_err(JudgeError::Aggregation)?;
        info!(
            "Vote tallied: {} FOR, {} AGAINST -> {}",
            decision.vote_tally.for_count, decision.vote_tally.against_count, decision.outcome
        );
        Ok(decision.with_narrative(Synthesis::placeholder()))
    }

    /// Tally the verdicts, then ask the capability to explain the outcome.
    pub async fn decide_with_synthesis(
        &self,
        question: &Question,
        verdicts: Vec<Verdict>,
    ) -> Result<Decision, JudgeError> {
        let decision = self.decide(verdicts)?;

        let request = CapabilityRequest::new(
            PromptTemplate::synthesis_prompt(
                question.content(),
                &decision.verdicts,
                &decision.vote_tally,
                decision.outcome,
            ),
            PromptTemplate::judge_system(),
        )
        .with_schema(OutputSchema::Synthesis);

        let synthesis = self
            .invoke(&request)
            .await
            .and_then(|payload| Ok(Synthesis::from_payload(&payload)?));

        match synthesis {
            Ok(synthesis) => Ok(decision.with_narrative(synthesis)),
            Err(source) => {
                warn!("Synthesis failed: {}", source);
                Err(JudgeError::Synthesis {
                    decision: Box::new(decision),
                    source,
                })
            }
        }
    }

    /// Fold chat-mode responses into one narrative.
    pub async fn decide_chat(
        &self,
        question: &Question,
        responses: Vec<FreeformResponse>,
        format: ChatFormat,
    ) -> Result<ChatResult, JudgeError> {
        if responses.len() < self.min_verdicts {
            return Err(JudgeError::Aggregation(DomainError::NotEnoughVerdicts {
                expected: self.min_verdicts,
                actual: responses.len(),
            }));
        }

        let schema = match format {
            ChatFormat::Explicit => OutputSchema::Synthesis,
            ChatFormat::Natural => OutputSchema::Answer,
        };
        let request = CapabilityRequest::new(
            PromptTemplate::chat_synthesis_prompt(question.content(), &responses, format),
            PromptTemplate::chat_system(),
        )
        .with_schema(schema);

        let narrative = self
            .invoke(&request)
            .await
            .and_then(|payload| Ok(ChatNarrative::from_payload(format, &payload)?))
            .map_err(JudgeError::Chat)?;

        info!("Chat synthesis complete ({} responses)", responses.len());
        Ok(ChatResult {
            responses,
            narrative,
        })
    }

    async fn invoke(&self, request: &CapabilityRequest) -> Result<Value, CapabilityError> {
        debug!("Judge invoking capability");
        tokio::time::timeout(self.timeout, self.capability.invoke(request))
            .await
            .map_err(|_| CapabilityError::Timeout(self.timeout))?
    }
}
