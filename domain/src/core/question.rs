//! Question value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// A question put to the council (Value Object)
///
/// Every worker receives the same question; the judge sees it again when
/// writing the synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Question {
    content: String,
}

impl Question {
    /// Create a question, rejecting empty or whitespace-only content
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }
        Ok(Self { content })
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<String> for Question {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Question::try_new(s)
    }
}

impl TryFrom<&str> for Question {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Question::try_new(s)
    }
}

impl From<Question> for String {
    fn from(q: Question) -> Self {
        q.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_creation() {
        let q = Question::try_new("Should we adopt AI for daily work?").unwrap();
        assert_eq!(q.content(), "Should we adopt AI for daily work?");
    }

    #[test]
    fn test_try_new_empty() {
        assert!(Question::try_new("").is_err());
        assert!(Question::try_new("   \n").is_err());
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        let parsed: Result<Question, _> = serde_json::from_str("\"  \"");
        assert!(parsed.is_err());

        let parsed: Question = serde_json::from_str("\"Ship it?\"").unwrap();
        assert_eq!(parsed.to_string(), "Ship it?");
    }
}
