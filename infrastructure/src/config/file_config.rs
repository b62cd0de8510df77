//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain/application types where
//! appropriate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tribunal_application::{CouncilConfig, ExecutionStrategy, FailurePolicy};
use tribunal_domain::Persona;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("council.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("council.personas cannot be empty")]
    NoPersonas,

    #[error("persona id cannot be empty")]
    EmptyPersonaId,

    #[error("duplicate persona id: {0}")]
    DuplicatePersona(String),

    #[error("council.min_verdicts ({min_verdicts}) exceeds the number of personas ({personas})")]
    MinVerdictsExceedsPersonas { min_verdicts: usize, personas: usize },

    #[error("provider.model cannot be empty")]
    EmptyModelName,

    #[error("provider.temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),
}

/// Raw council configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    pub strategy: ExecutionStrategy,
    pub failure_policy: FailurePolicy,
    /// Minimum verdicts for a lenient run
    pub min_verdicts: usize,
    /// Timeout in seconds for each capability call
    pub timeout_seconds: u64,
    /// Council members, in order
    pub personas: Vec<Persona>,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::default(),
            failure_policy: FailurePolicy::default(),
            min_verdicts: 1,
            timeout_seconds: 120,
            personas: Persona::default_council(),
        }
    }
}

/// Raw judge configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJudgeConfig {
    /// Ask the capability for a narrative after the vote
    pub synthesis: bool,
    /// Keep the tallied decision when the narrative call fails
    pub fallback_on_error: bool,
}

impl Default for FileJudgeConfig {
    fn default() -> Self {
        Self {
            synthesis: true,
            fallback_on_error: true,
        }
    }
}

/// Which capability adapter to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    /// Deterministic offline capability
    Mock,
}

/// Raw provider configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    /// Model used by the workers
    pub model: String,
    /// Model used by the judge (defaults to `model`)
    pub judge_model: Option<String>,
    pub temperature: f32,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:latest".to_string(),
            judge_model: None,
            temperature: 0.2,
        }
    }
}

impl FileProviderConfig {
    pub fn judge_model(&self) -> &str {
        self.judge_model.as_deref().unwrap_or(&self.model)
    }
}

/// Output format names accepted in `[output].format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutputFormat {
    Pretty,
    Json,
    Sse,
    Jsonl,
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: Option<FileOutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub council: FileCouncilConfig,
    pub judge: FileJudgeConfig,
    pub provider: FileProviderConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.council.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        if self.council.personas.is_empty() {
            return Err(ConfigValidationError::NoPersonas);
        }

        let mut seen = HashSet::new();
        for persona in &self.council.personas {
            if persona.id.trim().is_empty() {
                return Err(ConfigValidationError::EmptyPersonaId);
            }
            if !seen.insert(persona.id.as_str()) {
                return Err(ConfigValidationError::DuplicatePersona(persona.id.clone()));
            }
        }

        if self.council.min_verdicts > self.council.personas.len() {
            return Err(ConfigValidationError::MinVerdictsExceedsPersonas {
                min_verdicts: self.council.min_verdicts,
                personas: self.council.personas.len(),
            });
        }

        if self.provider.kind == ProviderKind::Ollama {
            if self.provider.model.trim().is_empty()
                || self.provider.judge_model().trim().is_empty()
            {
                return Err(ConfigValidationError::EmptyModelName);
            }
            let temperature = self.provider.temperature;
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigValidationError::InvalidTemperature(temperature));
            }
        }

        Ok(())
    }

    /// Build the application-level council configuration
    pub fn to_council_config(&self) -> CouncilConfig {
        CouncilConfig::new(self.council.personas.clone())
            .with_strategy(self.council.strategy)
            .with_failure_policy(self.council.failure_policy)
            .with_min_verdicts(self.council.min_verdicts)
            .with_timeout(Duration::from_secs(self.council.timeout_seconds))
            .with_synthesis(self.judge.synthesis)
            .with_synthesis_fallback(self.judge.fallback_on_error)
    }
}
