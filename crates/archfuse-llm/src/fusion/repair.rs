use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::call_for_object;
use super::prompt::{REPAIR_OPTIONS, repair_system_prompt};
use crate::{GenerateBackend, GenerateRequest, OracleError};

/// Ask the oracle once to fix a document that failed schema validation.
/// The reply is returned as-is; re-validating it is the caller's job.
pub async fn repair_document(
    backend: &impl GenerateBackend,
    invalid: &Map<String, Value>,
    errors: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Map<String, Value>, OracleError> {
    info!("Repair attempt for schema error: {}", errors);
    let prompt = json!({ "spec": invalid, "errors": errors }).to_string();
    let request = GenerateRequest::json(
        backend.model_name(),
        repair_system_prompt(),
        prompt,
        REPAIR_OPTIONS,
    );
    call_for_object(backend, request, timeout, cancel).await
}
