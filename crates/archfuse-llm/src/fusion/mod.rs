mod mock;
mod parse;
mod prompt;
mod repair;


pub use mock::{MOCK_NOTE, mock_from_graph};
pub use repair::repair_document;

use std::time::Duration;

use archfuse_core::{Generator, IntermediateGraph, NodeKind};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{GenerateBackend, GenerateRequest, OracleError};
use parse::{parse_object, truncate_chars};
use prompt::{FUSION_OPTIONS, fusion_system_prompt};

/// Time and size limits for the oracle-backed stages.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionSettings {
    pub fusion_timeout: Duration,
    pub repair_timeout: Duration,
    /// Chat is cut to this many characters before it reaches the prompt.
    pub chat_excerpt_chars: usize,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            fusion_timeout: Duration::from_secs(90),
            repair_timeout: Duration::from_secs(60),
            chat_excerpt_chars: 400,
        }
    }
}

/// What the oracle is shown: a compact view of the graph plus the start of
/// the chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub nodes: Vec<ProjectedNode>,
    /// `[from id, to id, protocol]`
    pub edges: Vec<[String; 3]>,
    pub notes: Vec<String>,
    pub chat: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeKind,
}

pub fn build_projection(graph: &IntermediateGraph, chat: &str, max_chat_chars: usize) -> Projection {
    Projection {
        nodes: graph
            .nodes
            .iter()
            .map(|n| ProjectedNode {
                id: n.id.clone(),
                label: n.label.clone(),
                node_type: n.node_type,
            })
            .collect(),
        edges: graph
            .edges
            .iter()
            .map(|e| {
                [
                    e.from.clone(),
                    e.to.clone(),
                    e.protocol.as_str().to_string(),
                ]
            })
            .collect(),
        notes: graph.notes.clone(),
        chat: truncate_chars(chat, max_chat_chars).to_string(),
    }
}

/// Result of [`fuse`]: the untyped document plus, when the mock stood in,
/// the reason the oracle answer was not used.
#[derive(Debug)]
pub struct Fused {
    pub document: Map<String, Value>,
    pub fallback: Option<OracleError>,
}

impl Fused {
    pub fn used_oracle(&self) -> bool {
        self.fallback.is_none()
    }
}

/// Ask the oracle to fuse the graph and chat into a spec document.
///
/// Nothing here validates the document; it only has to be a JSON object.
pub async fn fuse_with_oracle(
    backend: &impl GenerateBackend,
    graph: &IntermediateGraph,
    chat: &str,
    settings: &FusionSettings,
    cancel: &CancellationToken,
) -> Result<Map<String, Value>, OracleError> {
    let projection = build_projection(graph, chat, settings.chat_excerpt_chars);
    let prompt = serde_json::to_string(&projection).unwrap_or_default();
    debug!(
        nodes = projection.nodes.len(),
        edges = projection.edges.len(),
        chat_chars = projection.chat.chars().count(),
        "built fusion prompt"
    );

    let request = GenerateRequest::json(
        backend.model_name(),
        fusion_system_prompt(),
        prompt,
        FUSION_OPTIONS,
    );
    let mut document = call_for_object(backend, request, settings.fusion_timeout, cancel).await?;
    stamp_oracle_generator(&mut document);
    Ok(document)
}

/// Fuse with the oracle, falling back to [`mock_from_graph`] on any failure.
/// Never errors.
pub async fn fuse(
    backend: &impl GenerateBackend,
    graph: &IntermediateGraph,
    chat: &str,
    settings: &FusionSettings,
    cancel: &CancellationToken,
) -> Fused {
    match fuse_with_oracle(backend, graph, chat, settings, cancel).await {
        Ok(document) => {
            info!(model = backend.model_name(), "oracle fusion succeeded");
            Fused {
                document,
                fallback: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "oracle unusable, returning mock spec");
            Fused {
                document: mock_from_graph(graph).to_document(),
                fallback: Some(e),
            }
        }
    }
}

/// An oracle-supplied metadata object with no generator is marked as ours.
fn stamp_oracle_generator(document: &mut Map<String, Value>) {
    if let Some(Value::Object(metadata)) = document.get_mut("metadata") {
        metadata
            .entry("generator")
            .or_insert_with(|| Value::String(Generator::Llm.as_str().to_string()));
    }
}

/// One bounded, cancellable generate call whose text must be a JSON object.
pub(crate) async fn call_for_object(
    backend: &impl GenerateBackend,
    request: GenerateRequest,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Map<String, Value>, OracleError> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(OracleError::Cancelled),
        result = tokio::time::timeout(timeout, backend.generate(request)) => match result {
            Err(_) => return Err(OracleError::Timeout(timeout)),
            Ok(Err(e)) => return Err(OracleError::Request(format!("{e:#}"))),
            Ok(Ok(response)) => response,
        },
    };
    debug!(chars = response.response.len(), "oracle raw output received");
    parse_object(&response.response)
}
