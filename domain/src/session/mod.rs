//! Capability session concepts.
//!
//! - [`stream::CapabilityEvent`]: one item of a capability's streamed output

pub mod stream;
