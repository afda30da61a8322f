//! Format-neutral layout of an exported report.
//!
//! [`render`] fixes the content and order of the export. Writers only decide
//! how each block looks in their format.

use crate::report::DocumentationReport;

pub const TITLE: &str = "Python Documentation Report";

/// Header row of every table in the metadata section.
pub const COLUMN_HEADERS: [&str; 6] = [
    "Column Name",
    "Data Type",
    "Description",
    "Sample Values",
    "Source Table",
    "Source Column",
];

/// A rendered report, ready for a writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub title: String,
    /// "Generated for: <filename>" line under the title.
    pub subtitle: String,
    pub sections: Vec<Section>,
}

/// A numbered top-level section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    Bullet(String),
    /// Label of a table inside the metadata section.
    SubHeading(String),
    Table(TableBlock),
}

/// A table with a fixed header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    fn new(heading: &str) -> Self {
        Self {
            heading: heading.to_string(),
            blocks: Vec::new(),
        }
    }

    /// Bullet texts in order.
    pub fn bullets(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Bullet(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tables in order.
    pub fn tables(&self) -> Vec<&TableBlock> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }
}

impl RenderedDocument {
    /// Find a section by its heading text, ignoring the number prefix.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.heading.split_once(". ").map(|(_, rest)| rest) == Some(name))
    }
}

/// Lay out a report in the fixed six-section export order.
pub fn render(report: &DocumentationReport, filename: &str) -> RenderedDocument {
    let mut description = Section::new("1. Description");
    description
        .blocks
        .push(Block::Paragraph(report.description()));

    let mut grain = Section::new("2. Table Grain");
    grain.blocks.push(Block::Paragraph(report.table_grain()));

    let mut sources = Section::new("3. Data Sources");
    sources
        .blocks
        .extend(report.data_sources().into_iter().map(Block::Bullet));

    let mut outputs = Section::new("4. Databricks Tables (Output)");
    outputs.blocks.extend(
        report
            .databricks_tables()
            .into_iter()
            .map(|t| Block::Bullet(format!("{}: {}", t.table_name, t.description))),
    );

    let mut metadata = Section::new("5. Table Metadata");
    for table in report.table_metadata() {
        metadata
            .blocks
            .push(Block::SubHeading(format!("Table: {}", table.table_name)));
        metadata.blocks.push(Block::Table(TableBlock {
            header: COLUMN_HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: table
                .columns
                .iter()
                .map(|c| c.cells().iter().map(|v| v.to_string()).collect())
                .collect(),
        }));
    }

    let mut rules = Section::new("6. Integrated Rules");
    rules
        .blocks
        .extend(report.integrated_rules().into_iter().map(Block::Bullet));

    RenderedDocument {
        title: TITLE.to_string(),
        subtitle: format!("Generated for: {filename}"),
        sections: vec![description, grain, sources, outputs, metadata, rules],
    }
}
