//! Live rendering of a council event stream

use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tribunal_domain::Event;

/// Renders events to the terminal as they arrive.
///
/// Worker output streams inline under a per-worker heading; a spinner runs
/// while the judge deliberates; the final result is printed with
/// [`ConsoleFormatter`]. In quiet mode only the result and errors are shown.
pub struct EventRenderer {
    quiet: bool,
    spinner: Option<ProgressBar>,
    /// Whether the cursor sits at the start of a line
    line_start: bool,
}

impl EventRenderer {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: None,
            line_start: true,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Render one event
    pub fn render(&mut self, event: &Event) {
        match event {
            Event::JudgeStart if !self.quiet => {
                self.break_line();
                let pb = ProgressBar::new_spinner();
                pb.set_style(Self::spinner_style());
                pb.set_message("The judge is deliberating...");
                pb.enable_steady_tick(Duration::from_millis(100));
                self.spinner = Some(pb);
            }
            Event::JudgeComplete => self.stop_spinner(),
            Event::Error { message } => {
                self.stop_spinner();
                self.break_line();
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            Event::Final { .. } | Event::ChatResult { .. } => {
                self.stop_spinner();
                self.break_line();
                if let Some(text) = Self::describe(event) {
                    print!("{}", text);
                }
            }
            _ if self.quiet => {}
            Event::Content { text } => self.stream(text, false),
            Event::Reasoning { text } => self.stream(text, true),
            Event::Text { text } => {
                self.break_line();
                println!("{}", text);
            }
            _ => {
                if let Some(line) = Self::describe(event) {
                    self.break_line();
                    println!("{}", line);
                    self.line_start = true;
                }
            }
        }
    }

    /// Finish any pending output (call once the stream ends)
    pub fn finish(&mut self) {
        self.stop_spinner();
        self.break_line();
    }

    /// Static rendering of events that stand on their own line
    pub fn describe(event: &Event) -> Option<String> {
        match event {
            Event::WorkerStart { worker_id } => {
                Some(format!("{}", format!("── {} ──", worker_id).yellow().bold()))
            }
            Event::ToolUse { name } => Some(format!("  {}", format!("[tool: {}]", name).dimmed())),
            Event::WorkerVerdict { verdict } => Some(
                ConsoleFormatter::verdict_line(verdict)
                    .trim_end()
                    .to_string(),
            ),
            Event::WorkerResponse { response } => Some(format!(
                "  {} {} answered",
                "✓".green(),
                response.worker_id.bold()
            )),
            Event::WorkerComplete { .. } => Some(String::new()),
            Event::Final { decision } => Some(ConsoleFormatter::format_decision(decision)),
            Event::ChatResult { result } => Some(ConsoleFormatter::format_chat(result)),
            Event::Error { message } => Some(format!("{} {}", "Error:".red().bold(), message)),
            _ => None,
        }
    }

    fn stream(&mut self, text: &str, reasoning: bool) {
        if reasoning {
            print!("{}", text.italic().dimmed());
        } else {
            print!("{}", text.dimmed());
        }
        let _ = std::io::stdout().flush();
        self.line_start = text.ends_with('\n');
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn break_line(&mut self) {
        if !self.line_start {
            println!();
            self.line_start = true;
        }
    }
}

impl Drop for EventRenderer {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribunal_domain::{FreeformResponse, Stance, Verdict};

    #[test]
    fn test_describe_worker_events() {
        colored::control::set_override(false);

        assert_eq!(
            EventRenderer::describe(&Event::WorkerStart {
                worker_id: "scientist".into()
            }),
            Some("── scientist ──".to_string())
        );

        let verdict = Verdict::new("scientist", Stance::For, "Sound.", 0.8).unwrap();
        let line = EventRenderer::describe(&Event::WorkerVerdict { verdict }).unwrap();
        assert!(line.contains("● FOR"));
        assert!(line.ends_with("Sound."));

        let response = FreeformResponse::new("humanist", "Yes.");
        assert_eq!(
            EventRenderer::describe(&Event::WorkerResponse { response }),
            Some("  ✓ humanist answered".to_string())
        );
    }

    #[test]
    fn test_streamed_text_is_not_described() {
        assert_eq!(EventRenderer::describe(&Event::content("chunk")), None);
        assert_eq!(EventRenderer::describe(&Event::JudgeStart), None);
    }

    #[test]
    fn test_quiet_renderer_never_spins() {
        let mut renderer = EventRenderer::new(true);
        renderer.render(&Event::JudgeStart);
        assert!(renderer.spinner.is_none());
        renderer.render(&Event::JudgeComplete);
        renderer.finish();
    }

    #[test]
    fn test_spinner_stops_on_error() {
        let mut renderer = EventRenderer::new(false);
        renderer.render(&Event::JudgeStart);
        assert!(renderer.spinner.is_some());
        renderer.render(&Event::error("judge failed"));
        assert!(renderer.spinner.is_none());
    }
}
