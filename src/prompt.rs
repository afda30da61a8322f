//! Prompt construction for the documentation request.
//!
//! Every request carries exactly two messages: a fixed system preamble and a
//! user message made of the instruction template, the file name and the
//! verbatim source text.
//!
//! ```text
//! SYSTEM_ROLE ───────────────────────────────► system message
//! DOCUMENTATION_TEMPLATE + filename + source ─► user message
//! ```

use serde::{Deserialize, Serialize};

/// Instruction template sent ahead of the source text.
///
/// The JSON skeleton and the bulleted rules are what the model is held to;
/// [`crate::report::DocumentationReport`] reads exactly these keys.
pub const DOCUMENTATION_TEMPLATE: &str = r#"
You are provided with a Python script. Your task is to return extremely detailed documentation in a SINGLE JSON object (no additional text). The JSON MUST follow the exact structure below and every field must be present.

Note on "tableGrain": specify WHICH columns guarantee that the final output table will contain exactly ONE row per combination of those columns.

JSON FORMAT (copy exactly – populate all placeholders):
{
  "description": "string",
  "tableGrain": "string",
  "dataSources": ["string"],
  "databricksTables": [
    { "tableName": "string", "description": "string" }
  ],
  "tableMetadata": [
    {
      "tableName": "string",
      "columns": [
        {
          "columnName": "string",
          "dataType": "string",
          "description": "string",
          "sampleValues": "string",
          "sourceTable": "string",
          "sourceColumn": "string"
        }
      ]
    }
  ],
  "integratedRules": ["string"]
}

- Populate "dataSources" with ALL input tables or files referenced in the script.
- "databricksTables" lists every table the script creates or overwrites in Databricks along with a concise business-focused description.
- "tableMetadata" must be an array, one object per output table listed in "databricksTables". Each object has tableName and columns list.
- "integratedRules" should be a BULLETED LIST (array of strings) describing transformations/business logic in order.
- For the "sourceTable" field: if the script uses a temp view/CTE, resolve to the original underlying table.
- Do NOT omit any property. Use "N/A" if genuinely unknown.
- The response MUST be valid JSON – no markdown.
"#;

/// Persona and audience preamble.
pub const SYSTEM_ROLE: &str = concat!(
    "You are a technical documentation expert specializing in data pipeline and analytics code documentation for a business audience. ",
    "Your task is to help business users understand Python code related to sales representative activities with doctors and hospitals. ",
    "You create comprehensive, structured documentation following the provided template, explaining technical steps in business terms."
);

/// Chat role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The ordered system/user pair sent with a documentation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: Message,
    pub user: Message,
}

impl PromptPair {
    /// Messages in wire order.
    pub fn messages(&self) -> [&Message; 2] {
        [&self.system, &self.user]
    }

    /// Combined length of both message bodies, in bytes.
    pub fn content_len(&self) -> usize {
        self.system.content.len() + self.user.content.len()
    }
}

/// Build the request messages for one uploaded file.
///
/// The source text is embedded verbatim; nothing is trimmed or escaped.
pub fn build_messages(source: &str, filename: &str) -> PromptPair {
    let user = format!(
        "{DOCUMENTATION_TEMPLATE}\n\nPython file: {filename}\n\nPython Code:\n```python\n{source}\n```\n\nPlease generate the documentation following the exact template format provided above."
    );

    PromptPair {
        system: Message::system(SYSTEM_ROLE),
        user: Message::user(user),
    }
}
