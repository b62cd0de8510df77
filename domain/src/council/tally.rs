//! Vote counting
//!
//! The tally rule is deliberately simple: more FOR votes approve, more
//! AGAINST votes reject, equal counts tie. It is a pure function of the
//! multiset of stances, so verdict order never changes the outcome.

use super::verdict::{Stance, Verdict};
use serde::{Deserialize, Serialize};

/// Final outcome of a council vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Approve,
    Reject,
    Tie,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Approve => "APPROVE",
            Outcome::Reject => "REJECT",
            Outcome::Tie => "TIE",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vote counts, serialized as `{"FOR": n, "AGAINST": m}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    #[serde(rename = "FOR")]
    pub for_count: usize,
    #[serde(rename = "AGAINST")]
    pub against_count: usize,
}

impl VoteTally {
    pub fn new(for_count: usize, against_count: usize) -> Self {
        Self {
            for_count,
            against_count,
        }
    }

    /// Apply the majority / tie rule
    pub fn outcome(&self) -> Outcome {
        match self.for_count.cmp(&self.against_count) {
            std::cmp::Ordering::Greater => Outcome::Approve,
            std::cmp::Ordering::Less => Outcome::Reject,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }

    pub fn total(&self) -> usize {
        self.for_count + self.against_count
    }

    /// Visual summary, e.g. `[●●○]`
    pub fn vote_summary(&self) -> String {
        let mut summary = String::from("[");
        summary.extend(std::iter::repeat_n('●', self.for_count));
        summary.extend(std::iter::repeat_n('○', self.against_count));
        summary.push(']');
        summary
    }
}

/// Count the stances of a set of verdicts.
///
/// ```
/// use tribunal_domain::{tally, Outcome, Stance, Verdict};
///
/// let verdicts = vec![
///     Verdict::new("a", Stance::For, "", 0.9).unwrap(),
///     Verdict::new("b", Stance::Against, "", 0.6).unwrap(),
/// ];
/// assert_eq!(tally(&verdicts).outcome(), Outcome::Tie);
/// ```
pub fn tally(verdicts: &[Verdict]) -> VoteTally {
    verdicts
        .iter()
        .fold(VoteTally::default(), |mut acc, v| {
            match v.decision {
                Stance::For => acc.for_count += 1,
                Stance::Against => acc.against_count += 1,
            }
            acc
        })
}
