//! essaymark CLI
//!
//! ```bash
//! # Mark a first draft and keep the submission for the revision round
//! essaymark submit --group 3A --student Ana --student Ben --essay draft.txt --state ana.json
//!
//! # Review the revision against the first round
//! essaymark revise --state ana.json --essay revised.txt
//!
//! # Score a saved model payload without calling the model
//! essaymark score --payload payload.json --words 92
//!
//! # Show the rubric in force; pull the mark out of a report
//! essaymark rubric --format json
//! essaymark extract-mark report.txt
//! ```

mod config;
mod display;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use essaymark_ai::{GeminiClient, parse_annotation};
use essaymark_core::{FeedbackRenderer, Redactor, Stage, Submission, compute_score, word_count};
use essaymark_host::{FirstDraftOutcome, Grader, HostError};
use essaymark_sync::{RecordSink, SheetClient, TracingSink};
use tracing::info;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "essaymark")]
#[command(version)]
#[command(about = "Rubric-based marking of student compositions", long_about = None)]
struct Cli {
    /// Config file (defaults to ./essaymark.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Connection {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Spreadsheet web-app URL for the submission log
    #[arg(long, env = "GOOGLE_SHEET_URL")]
    sheet_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark a first draft
    Submit {
        /// Class group, e.g. 3A
        #[arg(short, long)]
        group: String,

        /// Student name (repeat, or separate with commas)
        #[arg(short, long = "student", required = true, value_delimiter = ',')]
        students: Vec<String>,

        /// Essay file (reads stdin if not provided)
        #[arg(short, long)]
        essay: Option<PathBuf>,

        /// Where to keep the submission for the revision round
        #[arg(long)]
        state: Option<PathBuf>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        connection: Connection,
    },

    /// Review a revision against the first draft's flagged errors
    Revise {
        /// Submission saved by `submit --state`
        #[arg(long)]
        state: PathBuf,

        /// Revised essay file (reads stdin if not provided)
        #[arg(short, long)]
        essay: Option<PathBuf>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        connection: Connection,
    },

    /// Score an annotation payload offline
    Score {
        /// Payload JSON as the model would return it
        #[arg(short, long)]
        payload: PathBuf,

        /// Word count of the essay
        #[arg(long, required_unless_present = "essay", conflicts_with = "essay")]
        words: Option<usize>,

        /// Essay file to count words from
        #[arg(long)]
        essay: Option<PathBuf>,

        /// Names to scrub from the report
        #[arg(long = "student", value_delimiter = ',')]
        students: Vec<String>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the rubric in force
    Rubric {
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the final mark found in a report
    ExtractMark {
        /// Report file (reads stdin if not provided)
        file: Option<PathBuf>,
    },

    /// Show a saved submission
    Status {
        #[arg(long)]
        state: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            if let Some(HostError::Malformed { raw, .. }) = e.downcast_ref::<HostError>() {
                eprintln!("--- model reply ---\n{raw}\n-------------------");
            }
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Submit {
            group,
            students,
            essay,
            state,
            format,
            connection,
        } => {
            submit_command(&config, group, students, essay, state, format, connection).await
        }
        Commands::Revise {
            state,
            essay,
            format,
            connection,
        } => revise_command(&config, state, essay, format, connection).await,
        Commands::Score {
            payload,
            words,
            essay,
            students,
            format,
        } => score_command(&config, payload, words, essay, students, format),
        Commands::Rubric { format } => rubric_command(&config, format),
        Commands::ExtractMark { file } => extract_mark_command(&config, file),
        Commands::Status { state } => {
            let submission = load_submission(&state)?;
            print!("{}", display::submission_card(&submission, &config.marking));
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ── Commands ──

async fn submit_command(
    config: &Config,
    group: String,
    students: Vec<String>,
    essay_path: Option<PathBuf>,
    state: Option<PathBuf>,
    format: OutputFormat,
    connection: Connection,
) -> Result<ExitCode> {
    if let Some(path) = &state
        && path.is_file()
        && load_submission(path)?.stage() != Stage::Drafting
    {
        bail!(
            "{} already holds a marked submission; use `revise` or another --state file",
            path.display()
        );
    }

    let essay = read_input(essay_path.as_deref())?;
    let grader = build_grader(config, connection)?;
    let mut submission = Submission::new(group, students);

    let outcome = grader.submit_first_draft(&mut submission, &essay).await?;
    if let Some(path) = &state {
        save_submission(path, &submission)?;
    }

    match format {
        OutputFormat::Text => println!("{}", outcome.feedback()),
        OutputFormat::Json => {
            let value = match &outcome {
                FirstDraftOutcome::Scored {
                    feedback,
                    score,
                    mark,
                } => serde_json::json!({
                    "outcome": "scored",
                    "mark": mark,
                    "score": score,
                    "feedback": feedback,
                }),
                FirstDraftOutcome::TooShort {
                    feedback,
                    word_count,
                } => serde_json::json!({
                    "outcome": "too_short",
                    "word_count": word_count,
                    "feedback": feedback,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn revise_command(
    config: &Config,
    state: PathBuf,
    essay_path: Option<PathBuf>,
    format: OutputFormat,
    connection: Connection,
) -> Result<ExitCode> {
    let mut submission = load_submission(&state)?;
    let revised = read_input(essay_path.as_deref())?;
    let grader = build_grader(config, connection)?;

    let report = grader.submit_revision(&mut submission, &revised).await?;
    save_submission(&state, &submission)?;

    match format {
        OutputFormat::Text => println!("{report}"),
        OutputFormat::Json => {
            let audit = submission.revision_round().map(|r| &r.audit);
            let value = serde_json::json!({ "report": report, "audit": audit });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn score_command(
    config: &Config,
    payload_path: PathBuf,
    words: Option<usize>,
    essay_path: Option<PathBuf>,
    students: Vec<String>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let rubric = config.rubric()?;
    let reply = std::fs::read_to_string(&payload_path)
        .with_context(|| format!("failed to read payload {}", payload_path.display()))?;
    let payload = parse_annotation(&reply, &rubric)
        .with_context(|| format!("invalid payload {}", payload_path.display()))?;

    let words = match (words, essay_path) {
        (Some(words), _) => words,
        (None, Some(path)) => word_count(&read_input(Some(path.as_path()))?),
        (None, None) => bail!("either --words or --essay is required"),
    };

    let renderer = FeedbackRenderer::new(&rubric, &config.marking, Redactor::new(students.as_slice()));
    if rubric.length.is_too_short(words) {
        info!(words, "payload ignored: essay too short");
        println!("{}", renderer.render_too_short());
        return Ok(ExitCode::SUCCESS);
    }

    let score = compute_score(&payload, words, &rubric);
    match format {
        OutputFormat::Text => println!("{}", renderer.render(&payload, &score)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&score)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn rubric_command(config: &Config, format: OutputFormat) -> Result<ExitCode> {
    let rubric = config.rubric()?;
    match format {
        OutputFormat::Text => print!("{}", display::rubric_table(&rubric)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rubric)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn extract_mark_command(config: &Config, file: Option<PathBuf>) -> Result<ExitCode> {
    let text = read_input(file.as_deref())?;
    match config.marking.extract_value(&text) {
        Some(mark) => {
            println!("{mark}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("no \"{}\" line found", config.marking.label.trim());
            Ok(ExitCode::from(2))
        }
    }
}

// ── Helpers ──

fn build_grader(config: &Config, connection: Connection) -> Result<Grader> {
    let rubric = config.rubric()?;
    let model = Arc::new(GeminiClient::new(connection.api_key, &config.model));

    let sheet_url = connection.sheet_url.or_else(|| config.sheet.url.clone());
    let timeout = config.sheet.timeout();
    let sink: Arc<dyn RecordSink> = match sheet_url {
        Some(url) => Arc::new(SheetClient::new(url, timeout)),
        None => Arc::new(TracingSink),
    };

    Ok(Grader::new(
        model,
        sink,
        rubric,
        config.assignment.clone(),
        config.marking.clone(),
    )
    .with_log_timeout(timeout))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

fn load_submission(path: &Path) -> Result<Submission> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submission {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("invalid submission file {}", path.display()))
}

fn save_submission(path: &Path, submission: &Submission) -> Result<()> {
    let json = serde_json::to_string_pretty(submission)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write submission {}", path.display()))?;
    info!(path = %path.display(), stage = submission.stage().as_str(), "saved submission");
    Ok(())
}
