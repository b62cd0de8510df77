//! Run orchestration concepts: modes and the event protocol.

pub mod event;
pub mod mode;
