//! Worker personas
//!
//! A persona is plain data: a stable id, a title and the viewpoints the
//! worker should weigh. Every worker is the same type; only its persona
//! differs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Stable identity, used as `worker_id` on every event
    pub id: String,
    /// Short role description, e.g. "the scientist"
    pub title: String,
    /// Viewpoints this worker weighs when deciding
    #[serde(default)]
    pub perspective: Vec<String>,
}

impl Persona {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            perspective: Vec::new(),
        }
    }

    pub fn with_perspective<I, S>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.perspective = points.into_iter().map(Into::into).collect();
        self
    }

    /// The default three-member council
    pub fn default_council() -> Vec<Persona> {
        vec![
            Persona::new("scientist", "the scientist").with_perspective([
                "logical consistency",
                "scientific evidence",
                "objective, data-driven judgement",
                "quantitative risk assessment",
            ]),
            Persona::new("guardian", "the guardian").with_perspective([
                "safety and protection",
                "long-term consequences",
                "care for the people affected",
                "risk avoidance",
            ]),
            Persona::new("humanist", "the humanist").with_perspective([
                "human emotion",
                "social impact",
                "ethical considerations",
                "empathy and understanding",
            ]),
        ]
    }
}
