use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::IntermediateGraph;

const UPLOADS_DIR: &str = "uploads";
const EXPORTS_DIR: &str = "exports";
const JOB_FILE: &str = "job.json";
const CHAT_FILE: &str = "chat.txt";
const GRAPH_FILE: &str = "intermediate.json";
const SPEC_FILE: &str = "last_spec.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("{artifact} not found for job {job}")]
    ArtifactNotFound { job: String, artifact: &'static str },

    #[error("Invalid file name: {0:?}")]
    InvalidName(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Contents of `job.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// On-disk job storage.
///
/// Directory layout:
/// ```text
/// <root>/
///   <job_id>/
///     job.json
///     chat.txt
///     uploads/            ← files as uploaded
///     intermediate.json   ← cached graph
///     last_spec.json      ← most recent fusion output
///     exports/            ← rendered downloads
/// ```
pub struct JobStorage {
    root: PathBuf,
}

impl JobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn job_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    pub fn uploads_dir(&self, id: &str) -> PathBuf {
        self.job_dir(id).join(UPLOADS_DIR)
    }

    pub fn exports_dir(&self, id: &str) -> PathBuf {
        self.job_dir(id).join(EXPORTS_DIR)
    }

    /// Create a fresh job directory and return its id.
    pub fn create_job(&self) -> Result<JobRecord> {
        let record = JobRecord {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };
        std::fs::create_dir_all(self.uploads_dir(&record.id))?;
        write_json(&self.job_dir(&record.id).join(JOB_FILE), &record)?;
        debug!(job = %record.id, "created job directory");
        Ok(record)
    }

    /// Resolve a job id to its directory. Unknown ids and ids that are not
    /// a single path component are reported as not found.
    pub fn resolve_job(&self, id: &str) -> Result<PathBuf> {
        if !is_single_component(id) {
            return Err(StorageError::JobNotFound(id.to_string()));
        }
        let dir = self.job_dir(id);
        if !dir.is_dir() {
            return Err(StorageError::JobNotFound(id.to_string()));
        }
        Ok(dir)
    }

    pub fn load_job(&self, id: &str) -> Result<JobRecord> {
        let dir = self.resolve_job(id)?;
        read_json(&dir.join(JOB_FILE), id, "job record")
    }

    /// Store one uploaded file. Only the final path component of `name` is
    /// used.
    pub fn save_upload(&self, id: &str, name: &str, data: &[u8]) -> Result<PathBuf> {
        let dir = self.resolve_job(id)?;
        let file_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| is_single_component(n))
            .ok_or_else(|| StorageError::InvalidName(name.to_string()))?;
        let uploads = dir.join(UPLOADS_DIR);
        std::fs::create_dir_all(&uploads)?;
        let path = uploads.join(file_name);
        std::fs::write(&path, data)?;
        debug!(job = id, file = file_name, bytes = data.len(), "saved upload");
        Ok(path)
    }

    pub fn save_chat(&self, id: &str, chat: &str) -> Result<()> {
        let dir = self.resolve_job(id)?;
        std::fs::write(dir.join(CHAT_FILE), chat)?;
        Ok(())
    }

    /// Chat notes for a job; a job without notes has an empty chat.
    pub fn load_chat(&self, id: &str) -> Result<String> {
        let dir = self.resolve_job(id)?;
        match std::fs::read_to_string(dir.join(CHAT_FILE)) {
            Ok(chat) => Ok(chat),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_graph(&self, id: &str, graph: &IntermediateGraph) -> Result<()> {
        let dir = self.resolve_job(id)?;
        write_json(&dir.join(GRAPH_FILE), graph)
    }

    pub fn load_graph(&self, id: &str) -> Result<IntermediateGraph> {
        let dir = self.resolve_job(id)?;
        read_json(&dir.join(GRAPH_FILE), id, "intermediate graph")
    }

    pub fn save_spec(&self, id: &str, spec: &Value) -> Result<()> {
        let dir = self.resolve_job(id)?;
        write_json(&dir.join(SPEC_FILE), spec)
    }

    pub fn load_spec(&self, id: &str) -> Result<Value> {
        let dir = self.resolve_job(id)?;
        read_json(&dir.join(SPEC_FILE), id, "spec")
    }

    /// Write a rendered export into the job's `exports/` directory.
    pub fn write_export(&self, id: &str, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        self.resolve_job(id)?;
        if !is_single_component(file_name) {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        let exports = self.exports_dir(id);
        std::fs::create_dir_all(&exports)?;
        let path = exports.join(file_name);
        std::fs::write(&path, data)?;
        Ok(path)
    }
}

fn is_single_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, data)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
    job: &str,
    artifact: &'static str,
) -> Result<T> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::ArtifactNotFound {
                job: job.to_string(),
                artifact,
            });
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, Node, NodeKind, Protocol};
    use serde_json::json;

    fn temp_storage() -> (JobStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let storage = JobStorage::new(dir.path().join("projects")).expect("create storage");
        (storage, dir)
    }

    #[test]
    fn test_create_and_resolve_job() {
        let (storage, _dir) = temp_storage();
        let job = storage.create_job().expect("create job");

        let dir = storage.resolve_job(&job.id).expect("resolve job");
        assert!(dir.join("uploads").is_dir());

        let loaded = storage.load_job(&job.id).expect("load job");
        assert_eq!(loaded, job);
    }

    #[test]
    fn test_unknown_job_is_not_found() {
        let (storage, _dir) = temp_storage();
        let err = storage.resolve_job("no-such-job").unwrap_err();
        assert!(matches!(err, StorageError::JobNotFound(_)));
    }

    #[test]
    fn test_path_like_job_ids_are_not_found() {
        let (storage, _dir) = temp_storage();
        for id in ["..", "../etc", "a/b", ""] {
            assert!(
                matches!(storage.resolve_job(id), Err(StorageError::JobNotFound(_))),
                "{id:?} should not resolve"
            );
        }
    }

    #[test]
    fn test_save_upload_keeps_only_file_name() {
        let (storage, _dir) = temp_storage();
        let job = storage.create_job().expect("create job");

        let path = storage
            .save_upload(&job.id, "../../evil/diagram.drawio", b"<mxfile/>")
            .expect("save upload");
        assert_eq!(path, storage.uploads_dir(&job.id).join("diagram.drawio"));
        assert!(path.exists());

        let err = storage.save_upload(&job.id, "..", b"x").unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)));
    }

    #[test]
    fn test_chat_defaults_to_empty() {
        let (storage, _dir) = temp_storage();
        let job = storage.create_job().expect("create job");
        assert_eq!(storage.load_chat(&job.id).expect("load chat"), "");

        storage
            .save_chat(&job.id, "orders talks to payments over gRPC")
            .expect("save chat");
        assert_eq!(
            storage.load_chat(&job.id).expect("load chat"),
            "orders talks to payments over gRPC"
        );
    }

    #[test]
    fn test_graph_cache_round_trip() {
        let (storage, _dir) = temp_storage();
        let job = storage.create_job().expect("create job");

        let graph = IntermediateGraph {
            nodes: vec![Node::new("o", NodeKind::Db, "Orders", "drawio")],
            edges: vec![Edge::new("o", "p", Protocol::Rest)],
            notes: vec!["svg: edges not parsed".to_string()],
            trace: vec![],
        };
        storage.save_graph(&job.id, &graph).expect("save graph");
        assert_eq!(storage.load_graph(&job.id).expect("load graph"), graph);
    }

    #[test]
    fn test_missing_spec_is_artifact_not_found() {
        let (storage, _dir) = temp_storage();
        let job = storage.create_job().expect("create job");
        let err = storage.load_spec(&job.id).unwrap_err();
        assert!(matches!(
            err,
            StorageError::ArtifactNotFound { artifact: "spec", .. }
        ));

        storage
            .save_spec(&job.id, &json!({"services": []}))
            .expect("save spec");
        assert_eq!(
            storage.load_spec(&job.id).expect("load spec"),
            json!({"services": []})
        );
    }

    #[test]
    fn test_write_export() {
        let (storage, _dir) = temp_storage();
        let job = storage.create_job().expect("create job");
        let path = storage
            .write_export(&job.id, "architecture.yaml", b"services: []\n")
            .expect("write export");
        assert_eq!(path, storage.exports_dir(&job.id).join("architecture.yaml"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "services: []\n");
    }
}
