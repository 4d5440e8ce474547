mod commands;

use anyhow::{Context, Result};
use archfuse_engine::{ExportFormat, FusionSettings};
use archfuse_llm::OracleConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// ── CLI ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "archfuse",
    version,
    about = "Turn architecture diagrams and chat notes into a validated architecture spec"
)]
struct Cli {
    /// Directory holding one subdirectory per job
    #[arg(long, env = "DATA_ROOT", default_value = "./projects", global = true)]
    data_root: PathBuf,

    /// Base URL of the Ollama server
    #[arg(
        long,
        env = "OLLAMA_URL",
        default_value = "http://localhost:11434",
        global = true
    )]
    ollama_url: String,

    /// Model used for fusion and repair
    #[arg(long, env = "OLLAMA_MODEL", default_value = "llama3:instruct", global = true)]
    model: String,

    /// Deadline for the fusion call
    #[arg(long, default_value_t = 90, global = true)]
    fusion_timeout_secs: u64,

    /// Deadline for the single repair call
    #[arg(long, default_value_t = 60, global = true)]
    repair_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a job from diagram files and optional chat notes
    Ingest {
        /// Diagram files (.drawio, .puml, .svg, .pdf, .png, .jpg)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Chat notes given inline
        #[arg(long, conflicts_with = "chat_file")]
        chat: Option<String>,

        /// Chat notes read from a file
        #[arg(long)]
        chat_file: Option<PathBuf>,
    },

    /// Parse a job's uploads and print the merged graph
    Intermediate { job: String },

    /// Fuse a job into an architecture spec (Ctrl-C cancels)
    Fuse { job: String },

    /// Render the job's latest spec
    Export {
        job: String,

        /// json, yaml or yml
        #[arg(long, default_value = "json")]
        format: ExportFormat,

        /// Also write the rendered spec here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check that the Ollama server answers
    Ping,
}

impl Cli {
    fn oracle_config(&self) -> OracleConfig {
        OracleConfig {
            base_url: self.ollama_url.clone(),
            model: self.model.clone(),
        }
    }

    fn fusion_settings(&self) -> FusionSettings {
        FusionSettings {
            fusion_timeout: Duration::from_secs(self.fusion_timeout_secs),
            repair_timeout: Duration::from_secs(self.repair_timeout_secs),
            ..Default::default()
        }
    }
}

// ── Logging ─────────────────────────────────────────────────────

/// Human-readable console output on stderr (stdout carries command
/// results) plus a JSON trace log rotated daily under `log_dir`.
fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("archfuse")
        .filename_suffix("txt")
        .build(log_dir)
        .context("Failed to create log file appender")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_filter = EnvFilter::new("trace");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(file_filter),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli.data_root.join("logs"))?;

    match &cli.command {
        Command::Ingest {
            files,
            chat,
            chat_file,
        } => commands::ingest(&cli, files, chat.as_deref(), chat_file.as_deref()),
        Command::Intermediate { job } => commands::intermediate(&cli, job),
        Command::Fuse { job } => commands::fuse(&cli, job).await,
        Command::Export {
            job,
            format,
            output,
        } => commands::export(&cli, job, *format, output.as_deref()),
        Command::Ping => commands::ping(&cli).await,
    }
}
