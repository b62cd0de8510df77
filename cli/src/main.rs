//! CLI entrypoint for tribunal
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use futures::stream::{self, Stream, StreamExt};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tribunal_application::{
    AnalysisCapability, EventStream, ExecutionStrategy, FailurePolicy, RunCouncilUseCase,
};
use tribunal_domain::{Event, InvocationPayload, Question, RunMode};
use tribunal_infrastructure::{
    ConfigLoader, EventWriter, FileConfig, FileOutputFormat, FrameStyle, JsonlEventLogger,
    MockCapability, ProviderKind, decode_stream,
};
use tribunal_presentation::{Cli, ConsoleFormatter, EventRenderer, OutputFormat};

/// Pause between mock stream chunks, so live output is visible
const MOCK_DELAY: Duration = Duration::from_millis(40);

const READ_CHUNK: usize = 8 * 1024;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; stdout stays clean for
    // framed output
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    if !config.output.color {
        colored::control::set_override(false);
    }

    let output = cli
        .output
        .or_else(|| config.output.format.map(output_format))
        .unwrap_or(OutputFormat::Pretty);

    // Decode mode: replay a recorded stream instead of running a council
    if let Some(path) = &cli.decode {
        let ok = if cli.decode_stdin() {
            info!("Decoding events from stdin");
            drain(decode_stream(read_chunks(tokio::io::stdin())), output, cli.quiet).await?
        } else {
            info!("Decoding events from {}", path.display());
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Cannot open {}", path.display()))?;
            drain(decode_stream(read_chunks(file)), output, cli.quiet).await?
        };
        return Ok(exit_code(ok));
    }

    let payload = build_payload(&cli)?;
    info!("Starting tribunal ({} mode)", payload.mode);

    // === Dependency Injection ===
    let (capability, judge_capability) = capabilities(&config)?;
    let mut use_case = RunCouncilUseCase::with_judge_capability(
        capability,
        judge_capability,
        config.to_council_config(),
    );

    if let Some(path) = &cli.log_events {
        match JsonlEventLogger::new(path) {
            Some(logger) => {
                info!("Logging events to {}", logger.path().display());
                use_case = use_case.with_event_logger(Arc::new(logger));
            }
            None => warn!("Event logging disabled: cannot write {}", path.display()),
        }
    }

    // Ctrl-C cancels the run; the stream then ends with an error event
    let cancellation = CancellationToken::new();
    let token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling run");
            token.cancel();
        }
    });

    let events = use_case.execute_stream(payload, cancellation);
    let ok = drain(into_stream(events), output, cli.quiet).await?;
    Ok(exit_code(ok))
}

/// Load, override and validate the configuration
fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        if let Some(path) = &cli.config
            && !path.exists()
        {
            bail!("Config file not found: {}", path.display());
        }
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Invalid configuration: {}", e))?
    };

    // CLI flags override file values
    if cli.parallel {
        config.council.strategy = ExecutionStrategy::Parallel;
    }
    if cli.lenient {
        config.council.failure_policy = FailurePolicy::Lenient;
    }
    if let Some(seconds) = cli.timeout {
        config.council.timeout_seconds = seconds;
    }
    if cli.mock {
        config.provider.kind = ProviderKind::Mock;
    }
    if let Some(synthesis) = cli.synthesis_override() {
        config.judge.synthesis = synthesis;
    }

    config.validate()?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn build_payload(cli: &Cli) -> Result<InvocationPayload> {
    if let Some(raw) = &cli.payload {
        return Ok(InvocationPayload::from_json(raw)?);
    }

    let Some(question) = &cli.question else {
        bail!("A question is required (or use --payload / --decode).");
    };
    let question = Question::try_new(question.as_str())?;
    Ok(match cli.mode {
        RunMode::Judge => InvocationPayload::judge(question),
        RunMode::Chat => InvocationPayload::chat(question, cli.format),
    })
}

type Capabilities = (Arc<dyn AnalysisCapability>, Arc<dyn AnalysisCapability>);

/// Worker and judge capabilities for the configured provider
fn capabilities(config: &FileConfig) -> Result<Capabilities> {
    match config.provider.kind {
        ProviderKind::Mock => {
            info!("Using the offline mock capability");
            let mock: Arc<dyn AnalysisCapability> =
                Arc::new(MockCapability::new().with_delay(MOCK_DELAY));
            Ok((Arc::clone(&mock), mock))
        }
        ProviderKind::Ollama => ollama_capabilities(config),
    }
}

#[cfg(feature = "ollama")]
fn ollama_capabilities(config: &FileConfig) -> Result<Capabilities> {
    use tribunal_infrastructure::{OllamaCapability, OllamaConfig};

    let provider = &config.provider;
    let for_model = |model: &str| OllamaConfig {
        base_url: provider.base_url.clone(),
        model: model.to_string(),
        temperature: provider.temperature,
    };

    let workers: Arc<dyn AnalysisCapability> =
        Arc::new(OllamaCapability::new(for_model(&provider.model))?);
    let judge: Arc<dyn AnalysisCapability> =
        Arc::new(OllamaCapability::new(for_model(provider.judge_model()))?);
    Ok((workers, judge))
}

#[cfg(not(feature = "ollama"))]
fn ollama_capabilities(_config: &FileConfig) -> Result<Capabilities> {
    bail!("This build has no Ollama support; use --mock or rebuild with the `ollama` feature")
}

fn output_format(format: FileOutputFormat) -> OutputFormat {
    match format {
        FileOutputFormat::Pretty => OutputFormat::Pretty,
        FileOutputFormat::Json => OutputFormat::Json,
        FileOutputFormat::Sse => OutputFormat::Sse,
        FileOutputFormat::Jsonl => OutputFormat::Jsonl,
    }
}

fn into_stream(events: EventStream) -> impl Stream<Item = Event> {
    stream::unfold(events, |mut events| async move {
        events.next().await.map(|event| (event, events))
    })
}

/// Read an async source as a stream of byte chunks
fn read_chunks<R>(reader: R) -> impl Stream<Item = std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    stream::unfold(Some(reader), |reader| async move {
        let mut reader = reader?;
        let mut buf = vec![0u8; READ_CHUNK];
        match reader.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(buf), Some(reader)))
            }
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Send every event to the chosen output. Returns false if the stream
/// reported an error.
async fn drain<S>(events: S, output: OutputFormat, quiet: bool) -> Result<bool>
where
    S: Stream<Item = Event>,
{
    let mut events = Box::pin(events);
    let mut ok = true;

    match output {
        OutputFormat::Pretty => {
            let mut renderer = EventRenderer::new(quiet);
            while let Some(event) = events.next().await {
                ok &= event.error_message().is_none();
                renderer.render(&event);
            }
            renderer.finish();
        }
        OutputFormat::Json => {
            let mut result = None;
            while let Some(event) = events.next().await {
                if let Some(message) = event.error_message() {
                    ok = false;
                    eprintln!("Error: {}", message);
                } else if event.is_terminal() {
                    result = Some(event);
                }
            }
            if let Some(event) = result {
                println!("{}", ConsoleFormatter::format_json(&event));
            }
        }
        OutputFormat::Sse | OutputFormat::Jsonl => {
            let style = if output == OutputFormat::Sse {
                FrameStyle::Sse
            } else {
                FrameStyle::JsonLines
            };
            let mut writer = EventWriter::new(tokio::io::stdout(), style);
            while let Some(event) = events.next().await {
                ok &= event.error_message().is_none();
                writer.write(&event).await?;
            }
        }
    }

    Ok(ok)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
