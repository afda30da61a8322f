//! The documentation report produced by the model.
//!
//! The report is kept as the untyped JSON object the model returned. Typed
//! views are derived on demand and never fail: a missing or wrongly-typed
//! key reads as an empty value.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level and nested key names of the report schema.
pub mod keys {
    pub const DESCRIPTION: &str = "description";
    pub const TABLE_GRAIN: &str = "tableGrain";
    pub const DATA_SOURCES: &str = "dataSources";
    pub const DATABRICKS_TABLES: &str = "databricksTables";
    pub const TABLE_METADATA: &str = "tableMetadata";
    pub const INTEGRATED_RULES: &str = "integratedRules";

    pub const TABLE_NAME: &str = "tableName";
    pub const COLUMNS: &str = "columns";

    pub const COLUMN_NAME: &str = "columnName";
    pub const DATA_TYPE: &str = "dataType";
    pub const SAMPLE_VALUES: &str = "sampleValues";
    pub const SOURCE_TABLE: &str = "sourceTable";
    pub const SOURCE_COLUMN: &str = "sourceColumn";

    /// Every top-level key the prompt asks for, in template order.
    pub const TOP_LEVEL: [&str; 6] = [
        DESCRIPTION,
        TABLE_GRAIN,
        DATA_SOURCES,
        DATABRICKS_TABLES,
        TABLE_METADATA,
        INTEGRATED_RULES,
    ];
}

/// Documentation for one script, as returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentationReport {
    fields: Map<String, Value>,
}

/// An entry of `databricksTables`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTable {
    pub table_name: String,
    pub description: String,
}

/// An entry of `tableMetadata`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub table_name: String,
    pub columns: Vec<ColumnMetadata>,
}

/// A column of a `tableMetadata` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub column_name: String,
    pub data_type: String,
    pub description: String,
    pub sample_values: String,
    pub source_table: String,
    pub source_column: String,
}

impl ColumnMetadata {
    /// Cell values in export column order.
    pub fn cells(&self) -> [&str; 6] {
        [
            self.column_name.as_str(),
            self.data_type.as_str(),
            self.description.as_str(),
            self.sample_values.as_str(),
            self.source_table.as_str(),
            self.source_column.as_str(),
        ]
    }
}

impl DocumentationReport {
    /// Wrap an already-parsed JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Convert back into a JSON value, unchanged.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn description(&self) -> String {
        text(self.fields.get(keys::DESCRIPTION))
    }

    pub fn table_grain(&self) -> String {
        text(self.fields.get(keys::TABLE_GRAIN))
    }

    pub fn data_sources(&self) -> Vec<String> {
        items(self.fields.get(keys::DATA_SOURCES))
            .map(|v| text(Some(v)))
            .collect()
    }

    pub fn databricks_tables(&self) -> Vec<OutputTable> {
        items(self.fields.get(keys::DATABRICKS_TABLES))
            .map(|v| OutputTable {
                table_name: field(v, keys::TABLE_NAME),
                description: field(v, keys::DESCRIPTION),
            })
            .collect()
    }

    pub fn table_metadata(&self) -> Vec<TableMetadata> {
        items(self.fields.get(keys::TABLE_METADATA))
            .map(|v| TableMetadata {
                table_name: field(v, keys::TABLE_NAME),
                columns: items(v.get(keys::COLUMNS))
                    .map(|c| ColumnMetadata {
                        column_name: field(c, keys::COLUMN_NAME),
                        data_type: field(c, keys::DATA_TYPE),
                        description: field(c, keys::DESCRIPTION),
                        sample_values: field(c, keys::SAMPLE_VALUES),
                        source_table: field(c, keys::SOURCE_TABLE),
                        source_column: field(c, keys::SOURCE_COLUMN),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn integrated_rules(&self) -> Vec<String> {
        items(self.fields.get(keys::INTEGRATED_RULES))
            .map(|v| text(Some(v)))
            .collect()
    }

    /// Top-level schema keys the model left out.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        keys::TOP_LEVEL
            .into_iter()
            .filter(|key| !self.fields.contains_key(*key))
            .collect()
    }

    /// `tableMetadata` table names with no matching `databricksTables` entry.
    ///
    /// The prompt requires every described table to be listed as an output;
    /// nothing enforces it, so callers surface these as warnings.
    pub fn unlisted_metadata_tables(&self) -> Vec<String> {
        let listed: HashSet<String> = self
            .databricks_tables()
            .into_iter()
            .map(|t| t.table_name)
            .collect();

        self.table_metadata()
            .into_iter()
            .map(|t| t.table_name)
            .filter(|name| !listed.contains(name))
            .collect()
    }

    /// User-facing notes about cross-reference gaps. Never fatal.
    ///
    /// Missing top-level keys are not included; they render as empty sections.
    pub fn warnings(&self) -> Vec<String> {
        self.unlisted_metadata_tables()
            .into_iter()
            .map(|name| {
                format!("table \"{name}\" has metadata but is not listed in databricksTables")
            })
            .collect()
    }
}

/// Array elements of `value`, or nothing when it is absent or not an array.
fn items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}

fn field(object: &Value, key: &str) -> String {
    text(object.get(key))
}

/// Display text for a scalar; structured values fall back to compact JSON.
fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}
