//! Domain layer for tribunal
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A fixed, ordered set of workers, each wearing a [`Persona`], evaluates
//! the same [`Question`]:
//!
//! - **Judge mode**: every worker returns a [`Verdict`] (FOR / AGAINST);
//!   the [`tally`] rule turns them into a [`Decision`]
//! - **Chat mode**: every worker returns a [`FreeformResponse`]; the judge
//!   folds them into a [`ChatResult`]
//!
//! ## Event protocol
//!
//! Runs are observed through [`Event`]s, grouped per worker and framed one
//! JSON document per line on the wire.

pub mod core;
pub mod council;
pub mod orchestration;
pub mod persona;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use core::{error::DomainError, payload::InvocationPayload, question::Question};
pub use council::{
    ChatNarrative, ChatResult, Decision, FreeformResponse, Outcome, OutputSchema,
    RATIONALE_MAX_CHARS, Stance, Synthesis, Verdict, VoteTally, tally,
};
pub use orchestration::{
    event::Event,
    mode::{ChatFormat, RunMode},
};
pub use persona::Persona;
pub use prompt::PromptTemplate;
pub use session::stream::CapabilityEvent;
