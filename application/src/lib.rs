//! Application layer for tribunal
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CouncilConfig, DEFAULT_TIMEOUT, ExecutionStrategy, FailurePolicy};
pub use ports::{
    capability::{AnalysisCapability, CapabilityError, CapabilityRequest, CapabilityStream},
    event_logger::{EventLogger, NoEventLogger},
};
pub use use_cases::judge::{Judge, JudgeError};
pub use use_cases::run_council::{
    EventStream, RunCouncilError, RunCouncilUseCase, RunOutput, RunState,
};
pub use use_cases::worker::{Worker, WorkerEventStream};
