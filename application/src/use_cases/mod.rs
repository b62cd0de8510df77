//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod judge;
pub mod run_council;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;
