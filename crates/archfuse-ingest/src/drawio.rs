use archfuse_core::{BoundingBox, Edge, Node};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::ParsedFile;
use crate::classify::{classify_label, guess_protocol};

const SOURCE: &str = "drawio";

/// Tags that start a new visual line in draw.io HTML labels.
const BLOCK_TAGS: [&str; 4] = ["div", "br", "p", "li"];

#[derive(Debug, Default)]
struct Cell {
    id: String,
    value: String,
    vertex: bool,
    edge: bool,
    source: String,
    target: String,
    bbox: Option<BoundingBox>,
}

/// Parse an uncompressed draw.io document.
///
/// Every `mxCell` with `vertex="1"` becomes a node and every one with
/// `edge="1"` becomes an edge. Malformed XML yields no facts, only a note.
pub fn parse_drawio(name: &str, content: &str) -> ParsedFile {
    let cells = match read_cells(content) {
        Ok(cells) => cells,
        Err(e) => {
            warn!(file = name, error = %e, "drawio parse failed");
            return ParsedFile::with_note(name, format!("drawio: xml parse failed: {e}"));
        }
    };

    let mut parsed = ParsedFile::new(name);
    if cells.is_empty() {
        parsed.notes.push(
            "drawio: no mxCell elements found; compressed diagrams are not supported".to_string(),
        );
        return parsed;
    }

    for (index, cell) in cells.into_iter().enumerate() {
        if cell.vertex {
            let id = if cell.id.is_empty() {
                format!("drawio-cell-{index}")
            } else {
                cell.id
            };
            let (kind, visible) = classify_label(&clean_label(&cell.value));
            let label = if visible.is_empty() {
                format!("node-{id}")
            } else {
                visible
            };
            let mut node = Node::new(id, kind, label, SOURCE);
            node.bbox = cell.bbox;
            parsed.nodes.push(node);
        } else if cell.edge {
            let protocol = guess_protocol(&clean_label(&cell.value));
            parsed
                .edges
                .push(Edge::new(cell.source, cell.target, protocol));
        }
    }

    debug!(
        file = name,
        nodes = parsed.nodes.len(),
        edges = parsed.edges.len(),
        "parsed drawio"
    );
    parsed
}

fn read_cells(content: &str) -> Result<Vec<Cell>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut cells: Vec<Cell> = Vec::new();
    // Index of the `mxCell` whose children are currently being read.
    let mut open: Option<usize> = None;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"mxCell" => {
                    cells.push(cell_from_element(e));
                    if matches!(event, Event::Start(_)) {
                        open = Some(cells.len() - 1);
                    }
                }
                b"mxGeometry" => {
                    if let Some(cell) = open.and_then(|i| cells.get_mut(i)) {
                        cell.bbox = geometry_from_element(e);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"mxCell" => open = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(cells)
}

fn cell_from_element(e: &BytesStart<'_>) -> Cell {
    let mut cell = Cell::default();
    for (key, value) in attributes(e) {
        match key.as_str() {
            "id" => cell.id = value,
            "value" => cell.value = value,
            "vertex" => cell.vertex = value == "1",
            "edge" => cell.edge = value == "1",
            "source" => cell.source = value,
            "target" => cell.target = value,
            _ => {}
        }
    }
    cell
}

fn geometry_from_element(e: &BytesStart<'_>) -> Option<BoundingBox> {
    let mut bbox = BoundingBox::default();
    let mut seen = false;
    for (key, value) in attributes(e) {
        let Ok(n) = value.parse::<f32>() else {
            continue;
        };
        match key.as_str() {
            "x" => bbox.x = n,
            "y" => bbox.y = n,
            "width" => bbox.width = n,
            "height" => bbox.height = n,
            _ => continue,
        }
        seen = true;
    }
    seen.then_some(bbox)
}

/// Attribute pairs with XML escapes resolved. Attributes that fail to parse
/// are skipped; values with unknown entities are kept raw.
pub(crate) fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect()
}

/// Recover the visible text of a draw.io label: HTML tags removed (block
/// tags become spaces), a few entities decoded, whitespace collapsed.
pub(crate) fn clean_label(raw: &str) -> String {
    let stripped = strip_html(raw);
    let unescaped = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#xa;", " ")
        .replace("&amp;", "&");
    unescaped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut tag: Option<String> = None;

    for ch in raw.chars() {
        match tag.as_mut() {
            None if ch == '<' => tag = Some(String::new()),
            None => out.push(ch),
            Some(body) if ch == '>' => {
                let name = body
                    .trim_start_matches('/')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if BLOCK_TAGS.contains(&name.as_str()) {
                    out.push(' ');
                }
                tag = None;
            }
            Some(body) => body.push(ch),
        }
    }

    // An unterminated `<` was literal text after all.
    if let Some(body) = tag {
        out.push('<');
        out.push_str(&body);
    }
    out
}
