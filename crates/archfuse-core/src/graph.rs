use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Semantic type of an architectural element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum NodeKind {
    #[default]
    Service,
    Db,
    Queue,
    Gateway,
    Ext,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Service => "service",
            NodeKind::Db => "db",
            NodeKind::Queue => "queue",
            NodeKind::Gateway => "gateway",
            NodeKind::Ext => "ext",
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "db" => NodeKind::Db,
            "queue" => NodeKind::Queue,
            "gateway" => NodeKind::Gateway,
            "ext" => NodeKind::Ext,
            _ => NodeKind::Service,
        }
    }
}

/// Protocol tag carried by an edge. `Unknown` encodes as the empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Protocol {
    #[serde(rename = "REST")]
    Rest,
    #[serde(rename = "gRPC")]
    Grpc,
    #[serde(rename = "PUB")]
    Pub,
    #[serde(rename = "SUB")]
    Sub,
    #[default]
    #[serde(rename = "")]
    Unknown,
}

impl Protocol {
    /// Exact keyword match, ignoring case. `None` for anything else.
    pub fn from_keyword(word: &str) -> Option<Protocol> {
        match word.trim().to_ascii_lowercase().as_str() {
            "rest" => Some(Protocol::Rest),
            "grpc" => Some(Protocol::Grpc),
            "pub" => Some(Protocol::Pub),
            "sub" => Some(Protocol::Sub),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Rest => "REST",
            Protocol::Grpc => "gRPC",
            Protocol::Pub => "PUB",
            Protocol::Sub => "SUB",
            Protocol::Unknown => "",
        }
    }

    pub fn is_synchronous(&self) -> bool {
        matches!(self, Protocol::Rest | Protocol::Grpc)
    }
}

impl From<String> for Protocol {
    fn from(s: String) -> Self {
        Protocol::from_keyword(&s).unwrap_or_default()
    }
}

/// Layout metadata copied from the source diagram. Not used after ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeKind,
    pub label: String,
    /// Tag of the parser that produced this node (`drawio`, `puml`, ...).
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        node_type: NodeKind,
        label: impl Into<String>,
        source: &str,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: label.into(),
            source: source.to_string(),
            bbox: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub protocol: Protocol,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            protocol,
        }
    }
}

/// Format-agnostic graph assembled from every parsed upload of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediateGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub notes: Vec<String>,
    /// Reserved for provenance chains; carried through untouched.
    #[serde(default)]
    pub trace: Vec<Value>,
}

impl IntermediateGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Edge endpoints that no node in this graph carries, in edge order,
    /// each reported once.
    pub fn dangling_endpoints(&self) -> Vec<&str> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for edge in &self.edges {
            for endpoint in [edge.from.as_str(), edge.to.as_str()] {
                if !ids.contains(endpoint) && seen.insert(endpoint) {
                    out.push(endpoint);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_unknown_defaults_to_service() {
        let kind: NodeKind = serde_json::from_str(r#""lambda""#).unwrap();
        assert_eq!(kind, NodeKind::Service);
        let kind: NodeKind = serde_json::from_str(r#""DB""#).unwrap();
        assert_eq!(kind, NodeKind::Db);
        assert_eq!(serde_json::to_string(&NodeKind::Gateway).unwrap(), r#""gateway""#);
    }

    #[test]
    fn test_protocol_canonical_spelling() {
        let p: Protocol = serde_json::from_str(r#""GRPC""#).unwrap();
        assert_eq!(p, Protocol::Grpc);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#""gRPC""#);
        let p: Protocol = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(p, Protocol::Unknown);
        assert_eq!(serde_json::to_string(&Protocol::Unknown).unwrap(), r#""""#);
    }

    #[test]
    fn test_protocol_sync_flag() {
        assert!(Protocol::Rest.is_synchronous());
        assert!(Protocol::Grpc.is_synchronous());
        assert!(!Protocol::Pub.is_synchronous());
        assert!(!Protocol::Unknown.is_synchronous());
    }

    #[test]
    fn test_graph_serialization_uses_type_key() {
        let graph = IntermediateGraph {
            nodes: vec![Node::new("a", NodeKind::Queue, "Events", "puml")],
            ..Default::default()
        };
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["nodes"][0]["type"], "queue");
        assert!(value["nodes"][0].get("bbox").is_none());

        let back: IntermediateGraph = serde_json::from_value(value).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn test_dangling_endpoints_reported_once() {
        let graph = IntermediateGraph {
            nodes: vec![Node::new("a", NodeKind::Service, "A", "puml")],
            edges: vec![
                Edge::new("a", "b", Protocol::Rest),
                Edge::new("b", "a", Protocol::Rest),
                Edge::new("a", "c", Protocol::Unknown),
            ],
            ..Default::default()
        };
        assert_eq!(graph.dangling_endpoints(), vec!["b", "c"]);
        assert!(!graph.is_empty());
        assert!(IntermediateGraph::default().is_empty());
    }
}
