//! Council voting domain
//!
//! A council is a fixed, ordered set of workers. Each worker votes FOR or
//! AGAINST a question (judge mode) or answers it freely (chat mode); the
//! judge folds the results into a single [`Decision`] or [`ChatResult`].
//!
//! ```text
//! Verdict × N ──tally──▶ VoteTally ──outcome──▶ APPROVE | REJECT | TIE
//!                                     │
//!                                     └──▶ Decision { narrative: Synthesis? }
//! ```

pub mod decision;
pub mod parsing;
pub mod schema;
pub mod tally;
pub mod verdict;

pub use decision::{ChatNarrative, ChatResult, Decision, Synthesis};
pub use schema::OutputSchema;
pub use tally::{Outcome, VoteTally, tally};
pub use verdict::{FreeformResponse, RATIONALE_MAX_CHARS, Stance, Verdict};
