use std::fmt;
use std::path::Path;

/// Closed set of upload formats the ingest stage knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Drawio,
    Puml,
    Svg,
    Pdf,
    Raster,
    Unknown,
}

impl FormatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKind::Drawio => "drawio",
            FormatKind::Puml => "puml",
            FormatKind::Svg => "svg",
            FormatKind::Pdf => "pdf",
            FormatKind::Raster => "raster",
            FormatKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a file name to its format by extension alone, ignoring case.
pub fn detect_format(file_name: &str) -> FormatKind {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("drawio") => FormatKind::Drawio,
        Some("puml" | "plantuml") => FormatKind::Puml,
        Some("svg") => FormatKind::Svg,
        Some("pdf") => FormatKind::Pdf,
        Some("png" | "jpg" | "jpeg") => FormatKind::Raster,
        _ => FormatKind::Unknown,
    }
}
