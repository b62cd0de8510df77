//! Application-level configuration.
//!
//! [`CouncilConfig`] controls how a council run behaves: who sits on the
//! council, how workers are scheduled, what happens when one fails, and
//! whether the judge writes a narrative.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tribunal_domain::Persona;

/// Default per-call timeout for capability invocations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How workers are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// Worker k+1 starts after worker k has finished
    #[default]
    Sequential,
    /// All workers run concurrently; events are still delivered grouped
    /// per worker in council order
    Parallel,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::Sequential => "sequential",
            ExecutionStrategy::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(ExecutionStrategy::Sequential),
            "parallel" => Ok(ExecutionStrategy::Parallel),
            _ => Err(format!(
                "Invalid strategy: {}. Valid options: sequential, parallel",
                s
            )),
        }
    }
}

/// What happens when a worker fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Any worker failure ends the run
    #[default]
    Strict,
    /// The failed worker abstains; the run continues as long as enough
    /// verdicts remain
    Lenient,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Strict => "strict",
            FailurePolicy::Lenient => "lenient",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(FailurePolicy::Strict),
            "lenient" => Ok(FailurePolicy::Lenient),
            _ => Err(format!(
                "Invalid failure policy: {}. Valid options: strict, lenient",
                s
            )),
        }
    }
}

/// Council run configuration.
#[derive(Debug, Clone)]
pub struct CouncilConfig {
    /// Council members, in order
    pub personas: Vec<Persona>,
    /// Per-call timeout; a streaming call gets one deadline for the whole stream
    pub timeout: Duration,
    pub strategy: ExecutionStrategy,
    pub failure_policy: FailurePolicy,
    /// Minimum verdicts needed under the lenient policy
    pub min_verdicts: usize,
    /// Whether the judge asks the capability for a narrative
    pub synthesis: bool,
    /// Fall back to the tallied decision when the narrative call fails
    pub synthesis_fallback: bool,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            personas: Persona::default_council(),
            timeout: DEFAULT_TIMEOUT,
            strategy: ExecutionStrategy::default(),
            failure_policy: FailurePolicy::default(),
            min_verdicts: 1,
            synthesis: true,
            synthesis_fallback: true,
        }
    }
}

impl CouncilConfig {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self {
            personas,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_min_verdicts(mut self, min_verdicts: usize) -> Self {
        self.min_verdicts = min_verdicts;
        self
    }

    pub fn with_synthesis(mut self, synthesis: bool) -> Self {
        self.synthesis = synthesis;
        self
    }

    pub fn with_synthesis_fallback(mut self, fallback: bool) -> Self {
        self.synthesis_fallback = fallback;
        self
    }

    /// Number of worker results the judge needs before aggregating.
    ///
    /// Strict runs need every worker; lenient runs need `min_verdicts`
    /// (at least one).
    pub fn required_verdicts(&self) -> usize {
        match self.failure_policy {
            FailurePolicy::Strict => self.personas.len().max(1),
            FailurePolicy::Lenient => self.min_verdicts.max(1),
        }
    }
}
