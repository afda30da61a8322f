//! Export of a report as a downloadable document.
//!
//! ```text
//! DocumentationReport ─► render ─► RenderedDocument ─► DocumentWriter ─► bytes
//!                                                      ├─ DocxWriter
//!                                                      └─ MarkdownWriter
//! ```
//!
//! Rendering is pure: the same report and filename always give the same
//! document.

mod document;
mod docx;
mod markdown;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use document::{render, Block, RenderedDocument, Section, TableBlock, COLUMN_HEADERS, TITLE};
pub use docx::DocxWriter;
pub use markdown::MarkdownWriter;

use crate::report::DocumentationReport;

/// Suffix added to the uploaded file's stem.
pub const FILENAME_SUFFIX: &str = "_documentation";

/// Errors from writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write docx: {0}")]
    Docx(String),

    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
}

/// Available export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Docx,
    Markdown,
}

impl ExportFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Markdown => "md",
        }
    }

    /// MIME type for the `Content-Type` header.
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
        }
    }

    /// Writer for this format.
    pub fn writer(self) -> Box<dyn DocumentWriter> {
        match self {
            ExportFormat::Docx => Box::new(DocxWriter),
            ExportFormat::Markdown => Box::new(MarkdownWriter),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Markdown => "markdown",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docx" | "word" => Ok(ExportFormat::Docx),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Turns a rendered document into file bytes.
pub trait DocumentWriter: Send + Sync {
    /// Format this writer produces.
    fn format(&self) -> ExportFormat;

    /// Serialize the document.
    fn write(&self, document: &RenderedDocument) -> Result<Vec<u8>, ExportError>;
}

/// A finished export, ready to be downloaded or saved.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Download name for an export of `source_filename`.
///
/// A trailing `.py` is replaced by `_documentation.<ext>`; any other name
/// gets the suffix appended as-is.
///
/// ```
/// use scriptdoc::export::{export_filename, ExportFormat};
///
/// assert_eq!(export_filename("foo.py", ExportFormat::Docx), "foo_documentation.docx");
/// ```
pub fn export_filename(source_filename: &str, format: ExportFormat) -> String {
    let stem = source_filename
        .strip_suffix(".py")
        .unwrap_or(source_filename);
    format!("{stem}{FILENAME_SUFFIX}.{}", format.extension())
}

/// Render and write a report in one step.
pub fn export(
    report: &DocumentationReport,
    source_filename: &str,
    format: ExportFormat,
) -> Result<ExportArtifact, ExportError> {
    let document = render(report, source_filename);
    let bytes = format.writer().write(&document)?;
    let filename = export_filename(source_filename, format);

    debug!(filename = %filename, bytes = bytes.len(), format = %format, "export written");

    Ok(ExportArtifact {
        filename,
        content_type: format.content_type(),
        bytes,
    })
}
