//! Parsing of raw model output.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::model::DocumentationReport;

/// The model's output could not be read as a report.
///
/// Both variants keep the raw text so it can be shown for manual inspection.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The text is not well-formed JSON.
    #[error("Failed to parse JSON from model: {source}")]
    InvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// The text is JSON, but not a single object.
    #[error("Failed to parse JSON from model: expected an object, found {found}")]
    NotAnObject { raw: String, found: &'static str },
}

impl ParseError {
    /// The text the model returned.
    pub fn raw(&self) -> &str {
        match self {
            Self::InvalidJson { raw, .. } | Self::NotAnObject { raw, .. } => raw,
        }
    }

    /// Take ownership of the returned text.
    pub fn into_raw(self) -> String {
        match self {
            Self::InvalidJson { raw, .. } | Self::NotAnObject { raw, .. } => raw,
        }
    }

    /// 1-based line and column of a syntax error, if known.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::InvalidJson { source, .. } => Some((source.line(), source.column())),
            Self::NotAnObject { .. } => None,
        }
    }
}

/// Parse the complete model output into a report.
///
/// Only well-formedness is checked. Missing keys and schema violations are
/// accepted as-is.
pub fn parse_response(raw: &str) -> Result<DocumentationReport, ParseError> {
    let value: Value = serde_json::from_str(raw).map_err(|source| {
        warn!(
            line = source.line(),
            column = source.column(),
            bytes = raw.len(),
            "model output is not valid JSON"
        );
        ParseError::InvalidJson {
            raw: raw.to_string(),
            source,
        }
    })?;

    match value {
        Value::Object(map) => {
            debug!(keys = map.len(), "parsed documentation report");
            Ok(DocumentationReport::from_map(map))
        }
        other => Err(ParseError::NotAnObject {
            raw: raw.to_string(),
            found: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
