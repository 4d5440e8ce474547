mod export;
mod repair;


pub use export::{ExportFile, ExportFormat};
pub use repair::{FusionOutcome, validate_with_repair};

use archfuse_core::IntermediateGraph;
use archfuse_core::sanitize::sanitize;
use archfuse_core::storage::{JobRecord, JobStorage, StorageError};
use archfuse_ingest::{build_intermediate, parse_directory};
use archfuse_llm::fusion::{FusionSettings, fuse};
use archfuse_llm::{GenerateBackend, OracleClient, OracleConfig};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("No spec for job {0}; run fuse first")]
    SpecNotFound(String),

    #[error(transparent)]
    Storage(StorageError),

    #[error("Export failed: {0}")]
    Export(String),
}

impl From<StorageError> for PipelineError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::JobNotFound(id) => PipelineError::JobNotFound(id),
            StorageError::ArtifactNotFound {
                job,
                artifact: "spec",
            } => PipelineError::SpecNotFound(job),
            other => PipelineError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// One uploaded file, as received.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub data: Vec<u8>,
}

/// Request-scoped orchestration over one job directory tree.
///
/// Every operation takes a job id and reads what it needs from disk; the
/// pipeline itself holds no per-job state.
pub struct Pipeline<B: GenerateBackend = OracleClient> {
    storage: JobStorage,
    backend: B,
    settings: FusionSettings,
}

impl Pipeline {
    pub fn new(storage: JobStorage, oracle: OracleConfig, settings: FusionSettings) -> Self {
        Self::with_backend(storage, OracleClient::new(oracle), settings)
    }
}

impl<B: GenerateBackend> Pipeline<B> {
    pub fn with_backend(storage: JobStorage, backend: B, settings: FusionSettings) -> Self {
        Self {
            storage,
            backend,
            settings,
        }
    }

    pub fn storage(&self) -> &JobStorage {
        &self.storage
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &FusionSettings {
        &self.settings
    }

    /// Create a job holding `uploads` and optional chat notes.
    pub fn create_job(&self, uploads: &[Upload], chat: Option<&str>) -> Result<JobRecord> {
        let job = self.storage.create_job()?;
        for upload in uploads {
            self.storage.save_upload(&job.id, &upload.name, &upload.data)?;
        }
        self.storage.save_chat(&job.id, chat.unwrap_or_default())?;
        info!(job = %job.id, files = uploads.len(), "created job");
        Ok(job)
    }

    /// Parse every upload of `job` and cache the merged graph.
    pub fn intermediate(&self, job: &str) -> Result<IntermediateGraph> {
        let record = self.storage.load_job(job)?;
        let uploads = self.storage.uploads_dir(job);
        let files = if uploads.is_dir() {
            parse_directory(&uploads).map_err(StorageError::from)?
        } else {
            Vec::new()
        };
        debug!(job, created_at = %record.created_at, files = files.len(), "parsed uploads");

        let graph = build_intermediate(files);
        if graph.is_empty() {
            warn!(job, "no components or links extracted from uploads");
        }
        let dangling = graph.dangling_endpoints();
        if !dangling.is_empty() {
            debug!(job, endpoints = ?dangling, "edges reference undeclared nodes");
        }
        self.storage.save_graph(job, &graph)?;
        info!(
            job,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            notes = graph.notes.len(),
            "built intermediate graph"
        );
        Ok(graph)
    }

    /// Run the whole chain for `job`: graph, fusion (or mock), sanitize,
    /// validate with one repair. The outcome is persisted as the job's
    /// latest spec whether or not it is valid.
    pub async fn fuse(&self, job: &str, cancel: &CancellationToken) -> Result<FusionOutcome> {
        let graph = self.intermediate(job)?;
        let chat = self.storage.load_chat(job)?;

        info!(job, model = self.backend.model_name(), "fusing");
        let fused = fuse(&self.backend, &graph, &chat, &self.settings, cancel).await;
        debug!(job, oracle = fused.used_oracle(), "fusion document ready");
        let sanitized = sanitize(fused.document);

        let outcome = validate_with_repair(
            &self.backend,
            sanitized.into_inner(),
            self.settings.repair_timeout,
            cancel,
        )
        .await;

        self.storage.save_spec(job, &outcome.spec_value())?;
        match &outcome {
            FusionOutcome::Valid { spec } => {
                info!(job, generator = spec.generator().as_str(), "fusion complete")
            }
            FusionOutcome::Incomplete { errors, .. } => {
                warn!(job, errors = %errors, "fusion produced an invalid spec")
            }
        }
        Ok(outcome)
    }

    /// Render the job's latest spec and keep a copy under `exports/`.
    pub fn export(&self, job: &str, format: ExportFormat) -> Result<ExportFile> {
        let spec = self.storage.load_spec(job)?;
        let body = format.render(&spec)?;
        let path = self.storage.write_export(
            job,
            &format!("architecture.{}", format.extension()),
            &body,
        )?;
        info!(job, format = %format, bytes = body.len(), "exported spec");
        Ok(ExportFile {
            file_name: format!("architecture-{job}.{}", format.extension()),
            content_type: format.content_type(),
            body,
            path,
        })
    }
}
