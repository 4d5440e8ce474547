use anyhow::{Context, Result};
use archfuse_core::storage::JobStorage;
use archfuse_engine::{ExportFormat, FusionOutcome, Pipeline, Upload};
use archfuse_llm::OracleClient;
use serde_json::{Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Cli;

/// Exit status of a fuse whose spec is still schema-invalid after repair.
const EXIT_INCOMPLETE: u8 = 2;

fn pipeline(cli: &Cli) -> Result<Pipeline> {
    let storage = JobStorage::new(&cli.data_root)
        .with_context(|| format!("Failed to open data root {}", cli.data_root.display()))?;
    Ok(Pipeline::new(storage, cli.oracle_config(), cli.fusion_settings()))
}

fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{text}");
    Ok(())
}

fn read_upload(path: &Path) -> Result<Upload> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    Ok(Upload { name, data })
}

pub fn ingest(
    cli: &Cli,
    files: &[PathBuf],
    chat: Option<&str>,
    chat_file: Option<&Path>,
) -> Result<ExitCode> {
    let uploads = files
        .iter()
        .map(|p| read_upload(p))
        .collect::<Result<Vec<_>>>()?;

    let chat = match chat_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read chat file {}", path.display()))?,
        ),
        None => chat.map(str::to_string),
    };

    let job = pipeline(cli)?.create_job(&uploads, chat.as_deref())?;
    print_json(&json!({
        "ok": true,
        "jobId": job.id,
        "files": uploads.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
    }))?;
    Ok(ExitCode::SUCCESS)
}

pub fn intermediate(cli: &Cli, job: &str) -> Result<ExitCode> {
    let graph = pipeline(cli)?.intermediate(job)?;
    print_json(&serde_json::to_value(&graph).context("Failed to encode graph")?)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn fuse(cli: &Cli, job: &str) -> Result<ExitCode> {
    let pipeline = pipeline(cli)?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling fusion");
                cancel.cancel();
            }
        })
    };

    let outcome = pipeline.fuse(job, &cancel).await;
    interrupt.abort();
    let outcome = outcome?;

    print_json(&outcome.to_response())?;
    Ok(match outcome {
        FusionOutcome::Valid { .. } => ExitCode::SUCCESS,
        FusionOutcome::Incomplete { .. } => ExitCode::from(EXIT_INCOMPLETE),
    })
}

pub fn export(
    cli: &Cli,
    job: &str,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<ExitCode> {
    let file = pipeline(cli)?.export(job, format)?;

    if let Some(path) = output {
        std::fs::write(path, &file.body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} to {}", file.file_name, path.display());
    }

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&file.body)
        .context("Failed to write export to stdout")?;
    if !file.body.ends_with(b"\n") {
        stdout.write_all(b"\n").context("Failed to write export to stdout")?;
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn ping(cli: &Cli) -> Result<ExitCode> {
    let client = OracleClient::new(cli.oracle_config());
    match client.ping().await {
        Ok(()) => {
            print_json(&json!({
                "ok": true,
                "url": client.config().base_url,
                "model": client.config().model,
            }))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Oracle ping failed: {:#}", e);
            print_json(&json!({
                "ok": false,
                "url": client.config().base_url,
                "error": format!("{e:#}"),
            }))?;
            Ok(ExitCode::FAILURE)
        }
    }
}
