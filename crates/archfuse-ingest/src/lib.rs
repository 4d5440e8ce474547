pub mod classify;
mod detect;
mod drawio;
mod merge;
mod puml;
mod stub;
mod svg;

pub use detect::*;
pub use drawio::parse_drawio;
pub use merge::build_intermediate;
pub use puml::{NOTHING_RECOGNIZED, parse_puml};
pub use stub::{PDF_UNSUPPORTED, RASTER_UNSUPPORTED, parse_pdf, parse_raster};
pub use svg::{EDGES_NOT_EXTRACTED, parse_svg};

use std::path::Path;

use archfuse_core::{Edge, Node};
use tracing::{debug, warn};

/// Facts extracted from one uploaded file.
///
/// Parsers never fail: anything they could not understand is described in
/// `notes` instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub notes: Vec<String>,
}

impl ParsedFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_note(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: vec![note.into()],
            ..Default::default()
        }
    }
}

/// Dispatch already-loaded bytes to the parser for `kind`. Text formats are
/// decoded lossily.
pub fn parse_content(kind: FormatKind, name: &str, data: &[u8]) -> ParsedFile {
    match kind {
        FormatKind::Drawio => parse_drawio(name, &String::from_utf8_lossy(data)),
        FormatKind::Puml => parse_puml(name, &String::from_utf8_lossy(data)),
        FormatKind::Svg => parse_svg(name, &String::from_utf8_lossy(data)),
        FormatKind::Pdf => parse_pdf(name),
        FormatKind::Raster => parse_raster(name),
        FormatKind::Unknown => ParsedFile::new(name),
    }
}

/// Read and parse one file. A read failure becomes a note.
pub fn parse_path(kind: FormatKind, path: &Path) -> ParsedFile {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match std::fs::read(path) {
        Ok(data) => parse_content(kind, &name, &data),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "failed to read upload");
            ParsedFile::with_note(&name, format!("{kind}: read failed for {name}: {e}"))
        }
    }
}

/// Parse every recognized file directly inside `dir`, in file-name order.
/// Files with an unknown extension are skipped.
pub fn parse_directory(dir: &Path) -> std::io::Result<Vec<ParsedFile>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut parsed = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let kind = detect_format(&name);
        if kind == FormatKind::Unknown {
            debug!(file = %name, "skipping upload with unknown format");
            continue;
        }
        debug!(file = %name, format = %kind, "parsing upload");
        parsed.push(parse_path(kind, &path));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archfuse_core::{NodeKind, Protocol};

    const DRAWIO: &str = r#"<mxfile><diagram><mxGraphModel><root>
        <mxCell id="o" value="db:Orders" vertex="1"/>
        <mxCell id="p" value="Payments" vertex="1"/>
        <mxCell id="e" value="REST" edge="1" source="o" target="p"/>
    </root></mxGraphModel></diagram></mxfile>"#;

    #[test]
    fn test_parse_directory_sorted_and_skips_unknown() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("b.puml"), "A --> B : grpc").expect("write puml");
        std::fs::write(dir.path().join("a.drawio"), DRAWIO).expect("write drawio");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write txt");
        std::fs::write(dir.path().join("c.PNG"), [0u8, 1, 2]).expect("write png");
        std::fs::create_dir(dir.path().join("nested.svg")).expect("create dir");

        let parsed = parse_directory(dir.path()).expect("parse directory");
        let names: Vec<&str> = parsed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a.drawio", "b.puml", "c.PNG"]);

        assert_eq!(parsed[0].nodes[0].node_type, NodeKind::Db);
        assert_eq!(parsed[1].edges[0].protocol, Protocol::Grpc);
        assert_eq!(parsed[2].notes, vec![RASTER_UNSUPPORTED.to_string()]);
    }

    #[test]
    fn test_parse_path_read_error_is_note() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let parsed = parse_path(FormatKind::Drawio, &dir.path().join("missing.drawio"));
        assert_eq!(parsed.name, "missing.drawio");
        assert!(parsed.nodes.is_empty());
        assert_eq!(parsed.notes.len(), 1);
        assert!(parsed.notes[0].starts_with("drawio: read failed"));
    }

    #[test]
    fn test_parse_content_dispatch() {
        let parsed = parse_content(FormatKind::Drawio, "x.drawio", DRAWIO.as_bytes());
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.edges.len(), 1);

        let parsed = parse_content(FormatKind::Pdf, "x.pdf", b"%PDF-1.7");
        assert_eq!(parsed.notes, vec![PDF_UNSUPPORTED.to_string()]);
    }

    #[test]
    fn test_pipeline_through_merge() {
        let files = vec![
            parse_content(FormatKind::Drawio, "a.drawio", DRAWIO.as_bytes()),
            parse_content(FormatKind::Svg, "b.svg", br#"<svg><text x="1" y="2">Gateway</text></svg>"#),
        ];
        let graph = build_intermediate(files);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.notes, vec![EDGES_NOT_EXTRACTED.to_string()]);
        assert!(graph.dangling_endpoints().is_empty());
    }
}
