//! Run modes and chat answer formats.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the council is asked to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Every worker votes FOR/AGAINST; the judge tallies
    #[default]
    Judge,
    /// Every worker answers freely; the judge synthesizes
    Chat,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Judge => "judge",
            RunMode::Chat => "chat",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "judge" => Ok(RunMode::Judge),
            "chat" => Ok(RunMode::Chat),
            _ => Err(format!("Invalid mode: {}. Valid values: judge, chat", s)),
        }
    }
}

/// How the judge phrases a chat-mode answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatFormat {
    /// Summary, key points and a recommendation
    #[default]
    Explicit,
    /// A single fused answer
    Natural,
}

impl ChatFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatFormat::Explicit => "explicit",
            ChatFormat::Natural => "natural",
        }
    }
}

impl std::fmt::Display for ChatFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChatFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "explicit" => Ok(ChatFormat::Explicit),
            "natural" => Ok(ChatFormat::Natural),
            _ => Err(format!("Invalid format: {}. Valid values: explicit, natural", s)),
        }
    }
}
