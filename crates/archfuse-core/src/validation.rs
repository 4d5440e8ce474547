use std::sync::LazyLock;

use jsonschema::{Draft, Validator};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ArchitectureSpec;

const ARCHITECTURE_SCHEMA: &str = include_str!("../schema/architecture.schema.json");

static VALIDATOR: LazyLock<Result<Validator, String>> = LazyLock::new(|| {
    let schema: Value = serde_json::from_str(ARCHITECTURE_SCHEMA)
        .map_err(|e| format!("schema is not valid JSON: {e}"))?;
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|e| format!("schema failed to compile: {e}"))
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Architecture schema unavailable: {0}")]
    Unavailable(String),

    /// One human-readable line listing every violation.
    #[error("{0}")]
    Invalid(String),

    #[error("Spec passed the schema but could not be decoded: {0}")]
    Decode(String),
}

/// Check a document against the architecture schema.
pub fn validate_document(doc: &Map<String, Value>) -> Result<(), SchemaError> {
    let validator = VALIDATOR
        .as_ref()
        .map_err(|e| SchemaError::Unavailable(e.clone()))?;

    let instance = Value::Object(doc.clone());
    let messages: Vec<String> = validator
        .iter_errors(&instance)
        .map(|e| format!("{}: {}", display_path(&e.instance_path.to_string()), e))
        .collect();

    if messages.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Invalid(messages.join("; ")))
    }
}

/// Root-level violations have an empty JSON pointer.
fn display_path(pointer: &str) -> &str {
    if pointer.is_empty() {
        "/"
    } else {
        pointer
    }
}

/// Validate, then decode into the typed spec.
pub fn validate_spec(doc: &Map<String, Value>) -> Result<ArchitectureSpec, SchemaError> {
    validate_document(doc)?;
    serde_json::from_value(Value::Object(doc.clone()))
        .map_err(|e| SchemaError::Decode(e.to_string()))
}
