//! Formats that are accepted but not yet understood.
//!
//! Both parsers return an otherwise empty result with a fixed note so the
//! job still records that the upload was seen.

use crate::ParsedFile;

pub const PDF_UNSUPPORTED: &str =
    "pdf: unsupported pending vector-text extraction; no structured facts extracted";

pub const RASTER_UNSUPPORTED: &str =
    "raster: unsupported pending OCR; no structured facts extracted";

pub fn parse_pdf(name: &str) -> ParsedFile {
    ParsedFile::with_note(name, PDF_UNSUPPORTED)
}

pub fn parse_raster(name: &str) -> ParsedFile {
    ParsedFile::with_note(name, RASTER_UNSUPPORTED)
}
