use std::time::Duration;

use archfuse_core::{ArchitectureSpec, Generator, SCHEMA_VERSION, validate_spec};
use archfuse_llm::GenerateBackend;
use archfuse_llm::fusion::repair_document;
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How fusion ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FusionOutcome {
    /// Schema-valid spec, straight from fusion or after one repair.
    Valid { spec: ArchitectureSpec },
    /// Still invalid after the repair attempt. `spec` is the document as it
    /// was before repair, marked `repair-fallback`; `errors` is the
    /// validation failure of that document.
    Incomplete { spec: Value, errors: String },
}

impl FusionOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, FusionOutcome::Valid { .. })
    }

    /// The spec document either way.
    pub fn spec_value(&self) -> Value {
        match self {
            FusionOutcome::Valid { spec } => Value::Object(spec.to_document()),
            FusionOutcome::Incomplete { spec, .. } => spec.clone(),
        }
    }

    /// Caller-facing body: the spec itself when valid, otherwise
    /// `{ok: false, errors, spec}`.
    pub fn to_response(&self) -> Value {
        match self {
            FusionOutcome::Valid { .. } => self.spec_value(),
            FusionOutcome::Incomplete { spec, errors } => json!({
                "ok": false,
                "errors": errors,
                "spec": spec,
            }),
        }
    }
}

/// Validate `document`; on failure ask the oracle once to repair it and
/// validate the answer as returned.
pub async fn validate_with_repair(
    backend: &impl GenerateBackend,
    document: Map<String, Value>,
    repair_timeout: Duration,
    cancel: &CancellationToken,
) -> FusionOutcome {
    let errors = match validate_spec(&document) {
        Ok(spec) => return FusionOutcome::Valid { spec },
        Err(e) => e.to_string(),
    };
    warn!(errors = %errors, "spec failed schema validation, attempting repair");

    match repair_document(backend, &document, &errors, repair_timeout, cancel).await {
        Ok(repaired) => match validate_spec(&repaired) {
            Ok(mut spec) => {
                spec.metadata.generator = Generator::Repair;
                info!("repaired spec passed validation");
                return FusionOutcome::Valid { spec };
            }
            Err(e) => warn!(error = %e, "repaired spec is still invalid"),
        },
        Err(e) => warn!(error = %e, "repair call unusable"),
    }

    FusionOutcome::Incomplete {
        spec: mark_repair_fallback(document),
        errors,
    }
}

fn mark_repair_fallback(mut document: Map<String, Value>) -> Value {
    let marker = Value::String(Generator::RepairFallback.as_str().to_string());
    match document.get_mut("metadata") {
        Some(Value::Object(metadata)) => {
            metadata.insert("generator".to_string(), marker);
            metadata
                .entry("schemaVersion")
                .or_insert_with(|| Value::String(SCHEMA_VERSION.to_string()));
        }
        other => {
            let mut metadata = Map::new();
            metadata.insert("schemaVersion".to_string(), json!(SCHEMA_VERSION));
            metadata.insert("generator".to_string(), marker);
            if let Some(original) = other.map(Value::take) {
                metadata.insert("original".to_string(), original);
            }
            document.insert("metadata".to_string(), Value::Object(metadata));
        }
    }
    Value::Object(document)
}
