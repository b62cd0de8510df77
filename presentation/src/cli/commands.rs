//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tribunal_domain::{ChatFormat, RunMode};

/// Output format for council runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Live rendering of the run, then the formatted result
    Pretty,
    /// The final result as one JSON document
    Json,
    /// Every event as a `data: `-prefixed line
    Sse,
    /// Every event as a bare JSON line
    Jsonl,
}

/// CLI arguments for tribunal
#[derive(Parser, Debug)]
#[command(name = "tribunal")]
#[command(author, version, about = "A council of reviewer models votes on your question")]
#[command(long_about = r#"
Tribunal puts one question to a council of workers, each reasoning from its
own persona, and folds their answers into a single result.

Modes:
  judge  Every worker votes FOR or AGAINST; the majority decides
         (APPROVE, REJECT or TIE) and the judge writes a synthesis
  chat   Every worker answers freely; the judge merges the answers

Configuration files are loaded from (in priority order):
1. TRIBUNAL_* environment variables
2. --config <path>       Explicit config file
3. ./tribunal.toml       Project-level config
4. ~/.config/tribunal/config.toml   Global config

Example:
  tribunal "Should we rewrite the billing service in Rust?"
  tribunal --mode chat --format natural "How should we version our API?"
  tribunal --mock --output jsonl "Adopt trunk-based development?" > run.jsonl
  tribunal --decode run.jsonl
"#)]
pub struct Cli {
    /// The question to put to the council
    pub question: Option<String>,

    /// Run mode
    #[arg(long, default_value = "judge", value_name = "judge|chat")]
    pub mode: RunMode,

    /// Chat answer framing
    #[arg(long, default_value = "explicit", value_name = "explicit|natural")]
    pub format: ChatFormat,

    /// Full invocation payload as JSON: {"question", "mode", "format"}
    #[arg(long, value_name = "JSON", conflicts_with_all = ["question", "decode"])]
    pub payload: Option<String>,

    /// Output format (defaults to [output].format, then pretty)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Ask the judge for a synthesis after the vote
    #[arg(long, overrides_with = "no_synthesis")]
    pub synthesis: bool,

    /// Skip the synthesis and report the tally only
    #[arg(long, overrides_with = "synthesis")]
    pub no_synthesis: bool,

    /// Run the workers concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Let a failed worker abstain instead of aborting the run
    #[arg(long)]
    pub lenient: bool,

    /// Timeout for each capability call, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Use the deterministic offline capability
    #[arg(long)]
    pub mock: bool,

    /// Render a recorded event stream (a file, or - for stdin) instead of running
    #[arg(long, value_name = "PATH|-")]
    pub decode: Option<PathBuf>,

    /// Append every event of the run to a JSONL file
    #[arg(long, value_name = "PATH")]
    pub log_events: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress live progress; print only the result
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Synthesis setting requested on the command line, if any
    pub fn synthesis_override(&self) -> Option<bool> {
        match (self.synthesis, self.no_synthesis) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Whether `--decode` reads from stdin
    pub fn decode_stdin(&self) -> bool {
        self.decode
            .as_deref()
            .is_some_and(|path| path.as_os_str() == "-")
    }
}
