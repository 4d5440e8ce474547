//! PlantUML component diagrams.
//!
//! Only two statement shapes carry facts: component declarations and
//! directed links. Everything else (skinparams, packages, notes, titles)
//! is skipped line by line.

mod grammar;
mod lexer;

use std::collections::HashMap;

use archfuse_core::{Edge, Node, NodeKind, Protocol};
use tracing::debug;

use crate::ParsedFile;
use crate::classify::{classify_label, guess_protocol};
use grammar::{Statement, parse_line};

const SOURCE: &str = "puml";

pub const NOTHING_RECOGNIZED: &str = "puml: no components/links recognized (check syntax)";

struct PendingLink {
    from: String,
    to: String,
    annotation: Option<String>,
}

/// Parse a PlantUML document into nodes and edges.
///
/// Links are resolved only after the whole file has been read, so a link
/// may name a component declared further down. Endpoints never declared
/// get a node of their own.
pub fn parse_puml(name: &str, content: &str) -> ParsedFile {
    let mut parsed = ParsedFile::new(name);
    // Label or alias -> node id.
    let mut ids: HashMap<String, String> = HashMap::new();
    let mut links: Vec<PendingLink> = Vec::new();
    let mut in_block_comment = false;

    for raw in content.lines() {
        let line = raw.trim();
        if in_block_comment {
            if line.ends_with("'/") {
                in_block_comment = false;
            }
            continue;
        }
        if line.starts_with("/'") {
            in_block_comment = !line[2..].ends_with("'/");
            continue;
        }
        if line.is_empty() || line.starts_with('\'') || line.starts_with('@') {
            continue;
        }

        match parse_line(line) {
            Some(Statement::Declaration {
                label,
                alias,
                keyword_kind,
            }) => declare(&mut parsed, &mut ids, &label, alias.as_deref(), keyword_kind),
            Some(Statement::Link {
                from,
                to,
                annotation,
            }) => links.push(PendingLink {
                from,
                to,
                annotation,
            }),
            None => {}
        }
    }

    for link in links {
        let from = resolve_endpoint(&mut parsed, &mut ids, &link.from);
        let to = resolve_endpoint(&mut parsed, &mut ids, &link.to);
        let protocol = link
            .annotation
            .as_deref()
            .map_or(Protocol::Unknown, annotation_protocol);
        parsed.edges.push(Edge::new(from, to, protocol));
    }

    if parsed.nodes.is_empty() && parsed.edges.is_empty() {
        parsed.notes.push(NOTHING_RECOGNIZED.to_string());
    }

    debug!(
        file = name,
        nodes = parsed.nodes.len(),
        edges = parsed.edges.len(),
        "parsed puml"
    );
    parsed
}

fn declare(
    parsed: &mut ParsedFile,
    ids: &mut HashMap<String, String>,
    raw_label: &str,
    alias: Option<&str>,
    keyword_kind: Option<NodeKind>,
) {
    let (cue_kind, label) = classify_label(raw_label);
    let kind = match (cue_kind, keyword_kind) {
        (NodeKind::Service, Some(hint)) => hint,
        (cue, _) => cue,
    };
    let id = alias.map_or_else(|| derive_id(&label), str::to_string);

    ids.insert(raw_label.to_string(), id.clone());
    ids.insert(label.clone(), id.clone());
    if let Some(alias) = alias {
        ids.insert(alias.to_string(), id.clone());
    }

    if parsed.nodes.iter().all(|n| n.id != id) {
        parsed.nodes.push(Node::new(id, kind, label, SOURCE));
    }
}

/// Map a link endpoint to a node id, synthesizing a node for names no
/// declaration introduced.
fn resolve_endpoint(
    parsed: &mut ParsedFile,
    ids: &mut HashMap<String, String>,
    endpoint: &str,
) -> String {
    if let Some(id) = ids.get(endpoint) {
        return id.clone();
    }
    let (kind, label) = classify_label(endpoint);
    let id = derive_id(&label);
    ids.insert(endpoint.to_string(), id.clone());
    if parsed.nodes.iter().all(|n| n.id != id) {
        parsed.nodes.push(Node::new(id.clone(), kind, label, SOURCE));
    }
    id
}

/// Identifier for a component with no explicit alias.
fn derive_id(label: &str) -> String {
    label
        .trim()
        .trim_matches('"')
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Protocol named by a link annotation. Explicit `<<tag>>` or `[tag]`
/// markers win, then a whole-word keyword, then a substring match.
fn annotation_protocol(annotation: &str) -> Protocol {
    let tagged = annotation
        .split("<<")
        .skip(1)
        .filter_map(|s| s.split(">>").next())
        .chain(
            annotation
                .split('[')
                .skip(1)
                .filter_map(|s| s.split(']').next()),
        )
        .find_map(Protocol::from_keyword);
    if let Some(protocol) = tagged {
        return protocol;
    }

    annotation
        .split(|c: char| !c.is_alphanumeric())
        .find_map(Protocol::from_keyword)
        .unwrap_or_else(|| guess_protocol(annotation))
}
