use archfuse_core::{
    ArchitectureSpec, Datastore, Dependency, DependencyKind, Generator, IntermediateGraph,
    NodeKind, Protocol, Service, Topic,
};
use serde_json::{Map, Value};

pub const MOCK_NOTE: &str = "LLM unavailable, returned mock spec";

/// Deterministic spec built from the graph alone, used when the oracle
/// gives nothing usable.
pub fn mock_from_graph(graph: &IntermediateGraph) -> ArchitectureSpec {
    let mut spec = ArchitectureSpec::empty(Generator::Mock);

    for node in &graph.nodes {
        match node.node_type {
            NodeKind::Db => spec.datastores.push(Datastore {
                name: node.label.clone(),
                engine: Some("unknown".to_string()),
                owner_service: None,
                extra: Map::new(),
            }),
            NodeKind::Queue => spec.topics.push(Topic {
                name: node.label.clone(),
                semantics: Some("at-least-once".to_string()),
                extra: Map::new(),
            }),
            other => spec.services.push(Service {
                name: node.label.clone(),
                service_type: other.as_str().to_string(),
                extra: Map::new(),
            }),
        }
    }

    for edge in &graph.edges {
        let kind = match edge.protocol {
            Protocol::Grpc => DependencyKind::Grpc,
            Protocol::Pub | Protocol::Sub => DependencyKind::Event,
            Protocol::Rest | Protocol::Unknown => DependencyKind::Rest,
        };
        spec.dependencies.push(Dependency {
            from: edge.from.clone(),
            to: edge.to.clone(),
            kind,
            sync: Some(edge.protocol.is_synchronous()),
            extra: Map::new(),
        });
    }

    spec.extra
        .insert("__note".to_string(), Value::String(MOCK_NOTE.to_string()));
    spec
}
