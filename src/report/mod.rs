//! Documentation reports: the parsed model output and its lenient views.

mod model;
mod parse;

pub use model::{keys, ColumnMetadata, DocumentationReport, OutputTable, TableMetadata};
pub use parse::{parse_response, ParseError};
