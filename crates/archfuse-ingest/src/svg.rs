use archfuse_core::{BoundingBox, Node};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

use crate::ParsedFile;
use crate::classify::classify_label;
use crate::drawio::attributes;

const SOURCE: &str = "svg";

pub const EDGES_NOT_EXTRACTED: &str = "svg: best-effort text extraction; edges not parsed";

struct TextElement {
    x: String,
    y: String,
    pieces: Vec<String>,
    depth: usize,
}

/// Turn every `<text>` element of an SVG into a node. Relationships are not
/// recovered from vector geometry.
pub fn parse_svg(name: &str, content: &str) -> ParsedFile {
    let mut parsed = ParsedFile::new(name);
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut current: Option<TextElement> = None;
    let mut index = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(file = name, error = %e, "svg parse stopped early");
                parsed.notes.push(format!("svg: xml parse failed: {e}"));
                break;
            }
        };

        match event {
            Event::Start(e) => match current.as_mut() {
                Some(text) => text.depth += 1,
                None if e.local_name().as_ref() == b"text" => {
                    let mut text = TextElement {
                        x: String::new(),
                        y: String::new(),
                        pieces: vec![],
                        depth: 1,
                    };
                    for (key, value) in attributes(&e) {
                        match key.as_str() {
                            "x" => text.x = value.trim().to_string(),
                            "y" => text.y = value.trim().to_string(),
                            _ => {}
                        }
                    }
                    current = Some(text);
                }
                None => {}
            },
            Event::Empty(e) if current.is_none() && e.local_name().as_ref() == b"text" => {
                index += 1;
            }
            Event::Text(t) => {
                if let Some(text) = current.as_mut() {
                    let piece = t
                        .unescape()
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    text.pieces.push(piece);
                }
            }
            Event::CData(c) => {
                if let Some(text) = current.as_mut() {
                    text.pieces.push(String::from_utf8_lossy(&c).into_owned());
                }
            }
            Event::End(_) => {
                if let Some(text) = current.as_mut() {
                    text.depth -= 1;
                    if text.depth == 0 {
                        if let Some(text) = current.take() {
                            push_text_node(&mut parsed, text, index);
                        }
                        index += 1;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    parsed.notes.push(EDGES_NOT_EXTRACTED.to_string());
    debug!(file = name, nodes = parsed.nodes.len(), "parsed svg");
    parsed
}

fn push_text_node(parsed: &mut ParsedFile, text: TextElement, index: usize) {
    let raw = text.pieces.join(" ");
    let (kind, label) = classify_label(&raw);
    if label.is_empty() {
        return;
    }
    let id = format!("svg_{}_{}_{}", text.x, text.y, index);
    let mut node = Node::new(id, kind, label, SOURCE);
    if let (Ok(x), Ok(y)) = (text.x.parse::<f32>(), text.y.parse::<f32>()) {
        node.bbox = Some(BoundingBox {
            x,
            y,
            ..Default::default()
        });
    }
    parsed.nodes.push(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use archfuse_core::NodeKind;

    #[test]
    fn test_text_elements_become_nodes() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <rect x="10" y="10" width="100" height="40"/>
            <text x="20" y="30">Orders</text>
            <text x="220" y="30">db:Ledger</text>
            <line x1="110" y1="30" x2="210" y2="30"/>
        </svg>"#;
        let parsed = parse_svg("a.svg", svg);
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.nodes[0].id, "svg_20_30_0");
        assert_eq!(parsed.nodes[0].label, "Orders");
        assert_eq!(parsed.nodes[1].node_type, NodeKind::Db);
        assert_eq!(parsed.nodes[1].label, "Ledger");
        assert!(parsed.edges.is_empty());
        assert_eq!(parsed.notes, vec![EDGES_NOT_EXTRACTED.to_string()]);
    }

    #[test]
    fn test_repeated_labels_get_distinct_ids() {
        let svg = r#"<svg>
            <text x="0" y="0">Worker</text>
            <text x="0" y="0">Worker</text>
        </svg>"#;
        let parsed = parse_svg("a.svg", svg);
        assert_eq!(parsed.nodes.len(), 2);
        assert_ne!(parsed.nodes[0].id, parsed.nodes[1].id);
    }

    #[test]
    fn test_tspans_are_joined() {
        let svg = r#"<svg><text x="5" y="6"><tspan>Order</tspan><tspan>Queue</tspan></text></svg>"#;
        let parsed = parse_svg("a.svg", svg);
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.nodes[0].label, "Order Queue");
        assert_eq!(parsed.nodes[0].node_type, NodeKind::Queue);
    }

    #[test]
    fn test_blank_text_skipped() {
        let svg = r#"<svg><text x="1" y="1">   </text><text/><text x="2" y="2">API Gateway</text></svg>"#;
        let parsed = parse_svg("a.svg", svg);
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.nodes[0].node_type, NodeKind::Gateway);
        assert_eq!(parsed.nodes[0].id, "svg_2_2_2");
    }

    #[test]
    fn test_broken_svg_keeps_earlier_nodes() {
        let svg = r#"<svg><text x="1" y="1">Orders</text><g></svg>"#;
        let parsed = parse_svg("a.svg", svg);
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.notes.len(), 2);
        assert!(parsed.notes[0].starts_with("svg: xml parse failed"));
        assert_eq!(parsed.notes[1], EDGES_NOT_EXTRACTED);
    }
}
