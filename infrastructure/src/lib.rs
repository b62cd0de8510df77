//! Infrastructure layer for tribunal
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: capability adapters, the event transport
//! codec, configuration file loading and event logging.

pub mod capability;
pub mod config;
pub mod logging;
pub mod transport;

// Re-export commonly used types
pub use capability::MockCapability;
#[cfg(feature = "ollama")]
pub use capability::{OllamaCapability, OllamaConfig, OllamaError};
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileCouncilConfig, FileJudgeConfig,
    FileOutputConfig, FileOutputFormat, FileProviderConfig, ProviderKind,
};
pub use logging::JsonlEventLogger;
pub use transport::{
    EventWriter, FrameError, FrameStyle, LineAssembler, StreamDecoder, decode_stream,
    encode_frame,
};
