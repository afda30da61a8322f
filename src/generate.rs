//! End-to-end generation from source text to a parsed report.
//!
//! ```text
//! source + filename → build_messages → CompletionService → raw text → parse_response
//! ```
//!
//! # Example
//!
//! ```ignore
//! use scriptdoc::generate::generate;
//!
//! let generated = generate(&client, &source, "orders_job.py", false).await?;
//! println!("{}", generated.report.description());
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::{CompletionService, LlmError};
use crate::prompt::build_messages;
use crate::report::{parse_response, DocumentationReport, ParseError};

// ============================================================================
// Error Types
// ============================================================================

/// Why a generation produced no report.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The completion service could not be reached or failed mid-response.
    #[error(transparent)]
    Transport(#[from] LlmError),

    /// The service answered, but its text is not a JSON object.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl GenerateError {
    /// Short machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Parse(_) => "parse",
        }
    }

    /// Raw model output, when there is some to show.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Transport(_) => None,
            Self::Parse(e) => Some(e.raw()),
        }
    }
}

pub type GenerateResult<T> = Result<T, GenerateError>;

// ============================================================================
// Result Types
// ============================================================================

/// A report together with the file it documents.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    /// Name of the uploaded source file.
    pub filename: String,

    /// The parsed report.
    pub report: DocumentationReport,

    /// Schema gaps noticed while reading the report.
    pub warnings: Vec<String>,

    /// Text exactly as the model returned it.
    #[serde(skip)]
    pub raw: String,
}

impl GeneratedReport {
    /// Parse raw model output for `filename`.
    pub fn from_raw(filename: impl Into<String>, raw: String) -> Result<Self, ParseError> {
        let report = parse_response(&raw)?;
        Ok(Self::new(filename, report, raw))
    }

    /// Wrap an already-parsed report.
    pub fn new(filename: impl Into<String>, report: DocumentationReport, raw: String) -> Self {
        let filename = filename.into();
        let missing = report.missing_fields();
        if !missing.is_empty() {
            debug!(filename = %filename, missing = ?missing, "report omits top-level keys");
        }
        let warnings = report.warnings();
        for warning in &warnings {
            warn!(filename = %filename, "{}", warning);
        }
        Self {
            filename,
            report,
            warnings,
            raw,
        }
    }
}

// ============================================================================
// Generation Functions
// ============================================================================

/// Generate documentation for one file.
///
/// With `stream` set the response is received incrementally and
/// concatenated before parsing; the result is the same as a blocking call
/// for the same model output.
pub async fn generate<S>(
    service: &S,
    source: &str,
    filename: &str,
    stream: bool,
) -> GenerateResult<GeneratedReport>
where
    S: CompletionService + ?Sized,
{
    if stream {
        generate_streaming(service, source, filename, |_| {}).await
    } else {
        let prompt = build_messages(source, filename);
        let raw = service.complete(&prompt).await?;
        finish(filename, raw)
    }
}

/// Generate documentation in streaming mode, reporting each fragment as it arrives.
///
/// `on_fragment` receives the fragments in arrival order. A failure after
/// some fragments were delivered discards them; no partial report is kept.
pub async fn generate_streaming<S, F>(
    service: &S,
    source: &str,
    filename: &str,
    mut on_fragment: F,
) -> GenerateResult<GeneratedReport>
where
    S: CompletionService + ?Sized,
    F: FnMut(&str) + Send,
{
    let prompt = build_messages(source, filename);
    let mut fragments = service.stream(&prompt).await?;

    let mut raw = String::new();
    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        on_fragment(&fragment);
        raw.push_str(&fragment);
    }

    finish(filename, raw)
}

fn finish(filename: &str, raw: String) -> GenerateResult<GeneratedReport> {
    let generated = GeneratedReport::from_raw(filename, raw)?;
    info!(
        filename = %filename,
        data_sources = generated.report.data_sources().len(),
        tables = generated.report.table_metadata().len(),
        rules = generated.report.integrated_rules().len(),
        "documentation generated"
    );
    Ok(generated)
}
