//! Prompt templates for the council flow

use crate::council::{FreeformResponse, Outcome, Verdict, VoteTally};
use crate::orchestration::mode::ChatFormat;
use crate::persona::Persona;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for a worker, built from its persona
    pub fn worker_system(persona: &Persona) -> String {
        let mut prompt = format!(
            "You are {} ({}), one member of a council of independent reviewers.\n",
            persona.id, persona.title
        );

        if !persona.perspective.is_empty() {
            prompt.push_str("\nWeigh the question from these viewpoints:\n");
            for point in &persona.perspective {
                prompt.push_str(&format!("- {}\n", point));
            }
        }

        prompt.push_str(
            r#"
Guidelines:
- Judge from your own standpoint, not what the other members might say
- State your reasoning clearly and concretely
- Stay within your role; different viewpoints are the point of the council"#,
        );
        prompt
    }

    /// User prompt asking a worker for a vote
    pub fn analyze_prompt(question: &str) -> String {
        format!(
            r#"Analyze the following question and vote on it:

{}

Respond with a JSON object:
- "decision": "FOR" or "AGAINST"
- "rationale": your reasoning in at most 200 characters
- "confidence": a number between 0.0 and 1.0"#,
            question
        )
    }

    /// User prompt asking a worker for an open answer
    pub fn respond_prompt(question: &str) -> String {
        format!(
            r#"Answer the following question from your standpoint:

{}

Respond with a JSON object with a single "text" field holding your answer."#,
            question
        )
    }

    /// System prompt for the judge
    pub fn judge_system() -> &'static str {
        r#"You are the judge of a council of independent reviewers.
You receive every member's verdict and write an integrated analysis.

Your role:
- Consider each member's viewpoint fairly
- Make common ground and disagreements explicit
- Write a constructive summary
- Give a concrete, actionable recommendation

The final outcome has already been decided by majority vote.
Your analysis explains that outcome; it does not change it."#
    }

    /// User prompt for the judge's synthesis of a vote
    pub fn synthesis_prompt(
        question: &str,
        verdicts: &[Verdict],
        tally: &VoteTally,
        outcome: Outcome,
    ) -> String {
        let mut prompt = format!(
            r#"Integrate the council's verdicts on the question below.

## Question
{}

## Verdicts
"#,
            question
        );

        for verdict in verdicts {
            prompt.push_str(&format!(
                "\n[{}]\n- decision: {}\n- rationale: {}\n- confidence: {:.2}\n",
                verdict.worker_id, verdict.decision, verdict.rationale, verdict.confidence
            ));
        }

        prompt.push_str(&format!(
            r#"
## Majority vote
- FOR: {}
- AGAINST: {}
- outcome: {}

Respond with a JSON object:
- "summary": an integrated analysis of about 200 characters
- "key_points": about three main points
- "recommendation": a final recommendation of about 100 characters"#,
            tally.for_count, tally.against_count, outcome
        ));

        prompt
    }

    /// System prompt for the judge in chat mode
    pub fn chat_system() -> &'static str {
        r#"You are the moderator of a council of independent reviewers.
Each member answered the same question from a different standpoint.
Combine their answers faithfully; do not invent positions nobody took."#
    }

    /// User prompt for the judge's chat-mode synthesis
    pub fn chat_synthesis_prompt(
        question: &str,
        responses: &[FreeformResponse],
        format: ChatFormat,
    ) -> String {
        let mut prompt = format!(
            r#"## Question
{}

## Answers
"#,
            question
        );

        for response in responses {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", response.worker_id, response.text));
        }

        match format {
            ChatFormat::Explicit => prompt.push_str(
                r#"
Summarize the answers section by section. Respond with a JSON object:
- "summary": what the council says overall
- "key_points": the main points, one per member viewpoint where relevant
- "recommendation": what the asker should do next"#,
            ),
            ChatFormat::Natural => prompt.push_str(
                r#"
Fuse the answers into one natural, conversational reply addressed to the asker.
Do not list the members separately. Respond with a JSON object with a single
"answer" field."#,
            ),
        }

        prompt
    }
}
