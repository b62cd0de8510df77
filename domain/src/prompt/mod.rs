//! Prompt templates for workers and the judge

pub mod template;

pub use template::PromptTemplate;
