//! Analysis capability adapters.
//!
//! - [`MockCapability`] runs offline and deterministically
//! - `OllamaCapability` talks to a local Ollama server (feature `ollama`)

mod mock;
#[cfg(feature = "ollama")]
mod ollama;

pub use mock::MockCapability;
#[cfg(feature = "ollama")]
pub use ollama::{OllamaCapability, OllamaConfig, OllamaError};
