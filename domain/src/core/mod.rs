//! Core domain concepts shared across all subdomains.
//!
//! - [`question::Question`]: a validated question to pose to the council
//! - [`payload::InvocationPayload`]: the `{question, mode, format}` request
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod payload;
pub mod question;
