//! Structural normalization of fusion output.
//!
//! [`sanitize`] is the only place an untyped oracle document is coerced
//! towards the architecture shape. It fills in what is missing and
//! canonicalizes enum-like strings; it never removes facts, apart from the
//! degenerate `apis` block described on [`drop_placeholder_apis`].

use serde_json::{Map, Value, json};

use crate::{DependencyKind, Generator, SCHEMA_VERSION};

const REQUIRED_ARRAYS: [&str; 7] = [
    "services",
    "dependencies",
    "datastores",
    "topics",
    "gaps",
    "conflicts",
    "trace",
];

const REQUIRED_OBJECTS: [&str; 3] = ["configs", "constraints", "deploymentHints"];

const PLACEHOLDER_SERVICE_NAME: &str = "unnamed-service";

/// A spec document that has been through [`sanitize`].
///
/// Every required key is present. Values of the wrong container kind are
/// left as they were so the schema validator can report them.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedSpec(Map<String, Value>);

impl SanitizedSpec {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

pub fn sanitize(mut doc: Map<String, Value>) -> SanitizedSpec {
    ensure_metadata(&mut doc);

    for key in REQUIRED_ARRAYS {
        doc.entry(key).or_insert_with(|| Value::Array(vec![]));
    }
    for key in REQUIRED_OBJECTS {
        doc.entry(key).or_insert_with(|| Value::Object(Map::new()));
    }

    if let Some(Value::Array(services)) = doc.get_mut("services") {
        for service in services.iter_mut().filter_map(Value::as_object_mut) {
            if is_blank(service.get("type")) {
                service.insert("type".into(), json!("service"));
            }
            if is_blank(service.get("name")) {
                service.insert("name".into(), json!(PLACEHOLDER_SERVICE_NAME));
            }
        }
    }

    if let Some(Value::Array(deps)) = doc.get_mut("dependencies") {
        for dep in deps.iter_mut().filter_map(Value::as_object_mut) {
            let raw = dep.get("kind").and_then(Value::as_str).unwrap_or_default();
            let kind = DependencyKind::normalize(raw);
            dep.insert("kind".into(), json!(kind.as_str()));
        }
    }

    drop_placeholder_apis(&mut doc);
    SanitizedSpec(doc)
}

fn ensure_metadata(doc: &mut Map<String, Value>) {
    match doc.get_mut("metadata") {
        None => {
            doc.insert(
                "metadata".into(),
                json!({
                    "schemaVersion": SCHEMA_VERSION,
                    "generator": Generator::Sanitizer.as_str(),
                }),
            );
        }
        Some(Value::Object(meta)) => {
            if is_blank(meta.get("schemaVersion")) {
                meta.insert("schemaVersion".into(), json!(SCHEMA_VERSION));
            }
            if is_blank(meta.get("generator")) {
                meta.insert("generator".into(), json!(Generator::Sanitizer.as_str()));
            }
        }
        // Wrong kind: left for the validator.
        Some(_) => {}
    }
}

/// Oracles like to emit `"apis": [{"name": "rest"}]` when they have nothing
/// to say about APIs. That block carries no information, so it goes.
fn drop_placeholder_apis(doc: &mut Map<String, Value>) {
    let is_placeholder = match doc.get("apis") {
        Some(Value::Array(apis)) if apis.len() == 1 => apis[0].as_object().is_some_and(|api| {
            api.get("name").and_then(Value::as_str) == Some("rest")
                && api
                    .iter()
                    .filter(|(k, _)| k.as_str() != "name")
                    .all(|(_, v)| is_empty_value(v))
        }),
        _ => false,
    };
    if is_placeholder {
        doc.remove("apis");
    }
}

/// Absent, `null`, empty, or the literal string `"null"`.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => {
            let s = s.trim();
            s.is_empty() || s == "null"
        }
        Some(_) => false,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
