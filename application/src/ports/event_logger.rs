//! Port for recording run transcripts.
//!
//! Defines the [`EventLogger`] trait for recording every council [`Event`]
//! to a structured log. This is separate from `tracing`-based operation
//! logs: tracing handles diagnostics, this port captures the transcript in a
//! machine-readable format (JSONL).

use tribunal_domain::Event;

/// Port for logging run events.
///
/// The `log` method is synchronous and non-fallible so it never disrupts
/// the run; logging failures are ignored by implementations.
pub trait EventLogger: Send + Sync {
    /// Record one event.
    fn log(&self, event: &Event);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoEventLogger;

impl EventLogger for NoEventLogger {
    fn log(&self, _event: &Event) {}
}
