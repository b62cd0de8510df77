//! Console output formatter for council results

use colored::{ColoredString, Colorize};
use tribunal_domain::{
    ChatNarrative, ChatResult, Decision, Event, Outcome, Stance, Synthesis, Verdict,
};

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a judge-mode decision: outcome, every verdict, the narrative
    pub fn format_decision(decision: &Decision) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Council Decision"));
        output.push('\n');

        output.push_str(&format!(
            "\n{} {} {} ({} FOR, {} AGAINST)\n",
            "Outcome:".cyan().bold(),
            Self::outcome_label(decision.outcome),
            decision.vote_tally.vote_summary(),
            decision.vote_tally.for_count,
            decision.vote_tally.against_count,
        ));
        if decision.is_unanimous() {
            output.push_str(&format!("{}\n", "Unanimous".green()));
        }

        output.push_str(&Self::section_header("Verdicts"));
        for verdict in &decision.verdicts {
            output.push_str(&Self::verdict_line(verdict));
        }

        match &decision.narrative {
            Some(synthesis) if !synthesis.is_placeholder() => {
                output.push_str(&Self::section_header("Synthesis"));
                output.push_str(&Self::synthesis(synthesis));
            }
            Some(synthesis) => {
                output.push_str(&format!("\n{}\n", synthesis.summary.dimmed()));
            }
            None => {}
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format a chat-mode result: each worker's answer, then the judge's
    pub fn format_chat(result: &ChatResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Council Answer"));
        output.push('\n');

        output.push_str(&Self::section_header("Responses"));
        for response in &result.responses {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ──", response.worker_id).yellow().bold(),
                Self::indent(&response.text, "  ")
            ));
        }

        match &result.narrative {
            ChatNarrative::Explicit(synthesis) => {
                output.push_str(&Self::section_header("Synthesis"));
                output.push_str(&Self::synthesis(synthesis));
            }
            ChatNarrative::Natural { answer } => {
                output.push_str(&Self::section_header("Answer"));
                output.push_str(&format!("\n{}\n", answer));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format an event as pretty-printed JSON
    pub fn format_json(event: &Event) -> String {
        serde_json::to_string_pretty(event).unwrap_or_else(|_| "{}".to_string())
    }

    /// One line per verdict: stance, confidence, worker, rationale
    pub fn verdict_line(verdict: &Verdict) -> String {
        let stance = match verdict.decision {
            Stance::For => "● FOR    ".green().bold(),
            Stance::Against => "○ AGAINST".red().bold(),
        };
        let mut line = format!(
            "  {} {:>4.0}%  {}\n",
            stance,
            verdict.confidence * 100.0,
            verdict.worker_id.bold()
        );
        if !verdict.rationale.is_empty() {
            line.push_str(&format!("{}\n", Self::indent(&verdict.rationale, "      ")));
        }
        line
    }

    fn synthesis(synthesis: &Synthesis) -> String {
        let mut output = format!("\n{}\n", synthesis.summary);

        if !synthesis.key_points.is_empty() {
            output.push_str(&format!("\n{}\n", "Key Points:".cyan().bold()));
            for point in &synthesis.key_points {
                output.push_str(&format!("  * {}\n", point));
            }
        }

        if !synthesis.recommendation.is_empty() {
            output.push_str(&format!(
                "\n{}\n{}\n",
                "Recommendation:".green().bold(),
                synthesis.recommendation
            ));
        }
        output
    }

    fn outcome_label(outcome: Outcome) -> ColoredString {
        match outcome {
            Outcome::Approve => outcome.as_str().green().bold(),
            Outcome::Reject => outcome.as_str().red().bold(),
            Outcome::Tie => outcome.as_str().yellow().bold(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
