use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SCHEMA_VERSION: &str = "0.1.0";

/// Which stage produced (or last touched) a spec's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Generator {
    Llm,
    Mock,
    Repair,
    RepairFallback,
    Sanitizer,
}

impl Generator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Generator::Llm => "llm",
            Generator::Mock => "mock",
            Generator::Repair => "repair",
            Generator::RepairFallback => "repair-fallback",
            Generator::Sanitizer => "sanitizer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Rest,
    Grpc,
    Event,
}

impl DependencyKind {
    /// Case-insensitive synonym match; anything unrecognized is `Rest`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grpc" => DependencyKind::Grpc,
            "event" | "pubsub" | "pub" | "sub" => DependencyKind::Event,
            _ => DependencyKind::Rest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Rest => "rest",
            DependencyKind::Grpc => "grpc",
            DependencyKind::Event => "event",
        }
    }
}

fn default_service_type() -> String {
    "service".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(rename = "type", default = "default_service_type")]
    pub service_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub from: String,
    pub to: String,
    pub kind: DependencyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datastore {
    pub name: String,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(rename = "ownerService", default)]
    pub owner_service: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub semantics: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    pub generator: Generator,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn new(generator: Generator) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generator,
            extra: Map::new(),
        }
    }
}

/// The validated architecture document.
///
/// Only constructed from a schema-valid JSON document (or built directly by
/// the mock fusion path). Fields the model does not know about are kept in
/// `extra` so nothing the oracle said is dropped on the way through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    pub services: Vec<Service>,
    pub dependencies: Vec<Dependency>,
    pub datastores: Vec<Datastore>,
    pub topics: Vec<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apis: Option<Vec<Value>>,
    pub configs: Map<String, Value>,
    #[serde(default)]
    pub constraints: Map<String, Value>,
    #[serde(rename = "deploymentHints", default)]
    pub deployment_hints: Map<String, Value>,
    pub gaps: Vec<Value>,
    pub conflicts: Vec<Value>,
    pub trace: Vec<Value>,
    pub metadata: Metadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArchitectureSpec {
    pub fn empty(generator: Generator) -> Self {
        Self {
            services: vec![],
            dependencies: vec![],
            datastores: vec![],
            topics: vec![],
            apis: None,
            configs: Map::new(),
            constraints: Map::new(),
            deployment_hints: Map::new(),
            gaps: vec![],
            conflicts: vec![],
            trace: vec![],
            metadata: Metadata::new(generator),
            extra: Map::new(),
        }
    }

    pub fn generator(&self) -> Generator {
        self.metadata.generator
    }

    pub fn to_document(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dependency_kind_synonyms() {
        assert_eq!(DependencyKind::normalize("gRPC"), DependencyKind::Grpc);
        assert_eq!(DependencyKind::normalize("PubSub"), DependencyKind::Event);
        assert_eq!(DependencyKind::normalize("EVENT"), DependencyKind::Event);
        assert_eq!(DependencyKind::normalize("http"), DependencyKind::Rest);
        assert_eq!(DependencyKind::normalize(""), DependencyKind::Rest);
    }

    #[test]
    fn test_generator_wire_names() {
        assert_eq!(
            serde_json::to_value(Generator::RepairFallback).unwrap(),
            json!("repair-fallback")
        );
        assert_eq!(Generator::Mock.as_str(), "mock");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let doc = json!({
            "services": [{"name": "orders", "type": "service", "owner": "team-a"}],
            "dependencies": [{"from": "a", "to": "b", "kind": "grpc", "sync": true}],
            "datastores": [{"name": "orders-db", "engine": "postgres", "ownerService": "orders"}],
            "topics": [{"name": "order-events"}],
            "configs": {},
            "gaps": ["payment provider unknown"],
            "conflicts": [],
            "trace": [{"original": "Orders Service", "slug": "orders"}],
            "metadata": {"schemaVersion": "0.1.0", "generator": "llm", "model": "llama3"},
            "__note": "kept"
        });

        let spec: ArchitectureSpec = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(spec.services[0].extra["owner"], "team-a");
        assert_eq!(spec.metadata.extra["model"], "llama3");
        assert_eq!(spec.extra["__note"], "kept");

        let back = Value::Object(spec.to_document());
        assert_eq!(back["services"], doc["services"]);
        assert_eq!(back["__note"], doc["__note"]);
        assert_eq!(back["metadata"], doc["metadata"]);
    }

    #[test]
    fn test_explicit_nulls_survive_round_trip() {
        let mut doc = ArchitectureSpec::empty(Generator::Llm).to_document();
        doc.insert(
            "datastores".into(),
            json!([{"name": "ledger", "engine": null, "ownerService": null}]),
        );
        doc.insert("topics".into(), json!([{"name": "t", "semantics": null}]));

        let spec: ArchitectureSpec = serde_json::from_value(Value::Object(doc.clone())).unwrap();
        let back = spec.to_document();
        assert_eq!(back["datastores"], doc["datastores"]);
        assert_eq!(back["topics"], doc["topics"]);
    }

    #[test]
    fn test_empty_spec_has_metadata() {
        let doc = ArchitectureSpec::empty(Generator::Mock).to_document();
        assert_eq!(doc["metadata"]["generator"], "mock");
        assert_eq!(doc["metadata"]["schemaVersion"], SCHEMA_VERSION);
        assert!(doc.get("apis").is_none());
    }
}
