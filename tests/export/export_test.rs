//! Export tests: filenames, layout and both writers.

use std::io::{Cursor, Read};

use scriptdoc::export::{export, export_filename, render, Block, ExportFormat, MarkdownWriter};
use scriptdoc::report::parse_response;

const REPORT: &str = r#"{
    "description": "Loads hospital call plans.\nRuns nightly.",
    "tableGrain": "plan_id",
    "dataSources": ["crm.call_plans"],
    "databricksTables": [{"tableName": "gold.call_plans", "description": "Current plans"}],
    "tableMetadata": [
        {"tableName": "gold.call_plans", "columns": [
            {"columnName": "plan_id", "dataType": "string", "description": "Plan key",
             "sampleValues": "P1", "sourceTable": "crm.call_plans", "sourceColumn": "id"}
        ]},
        {"tableName": "gold.no_columns"}
    ],
    "integratedRules": ["Only active plans"]
}"#;

#[test]
fn test_download_names() {
    assert_eq!(
        export_filename("foo.py", ExportFormat::Docx),
        "foo_documentation.docx"
    );
    assert_eq!(
        export_filename("call_plans.py", ExportFormat::Markdown),
        "call_plans_documentation.md"
    );
    assert_eq!(
        export_filename("script.txt", ExportFormat::Docx),
        "script.txt_documentation.docx"
    );
}

#[test]
fn test_docx_contains_report_text() {
    let report = parse_response(REPORT).unwrap();
    let artifact = export(&report, "call_plans.py", ExportFormat::Docx).unwrap();

    assert_eq!(artifact.filename, "call_plans_documentation.docx");
    assert_eq!(
        artifact.content_type,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );

    let mut header = [0u8; 4];
    artifact.bytes.as_slice().read_exact(&mut header).unwrap();
    assert_eq!(&header, b"PK\x03\x04");

    let xml = document_xml(&artifact.bytes);
    assert!(xml.contains("Loads hospital call plans."));
    assert!(xml.contains("Table: gold.no_columns"));
}

fn document_xml(bytes: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

#[test]
fn test_docx_body_matches_report_shape() {
    let report = parse_response(
        r#"{
            "description": "Scores hospital accounts.",
            "tableGrain": "account_id",
            "dataSources": ["crm.accounts", "crm.calls", "ref.hospitals"],
            "databricksTables": [{"tableName": "gold.account_scores", "description": "Scores"}],
            "tableMetadata": [
                {"tableName": "gold.account_scores", "columns": [
                    {"columnName": "account_id", "dataType": "string"},
                    {"columnName": "score", "dataType": "double"}
                ]},
                {"tableName": "gold.account_scores_empty"}
            ],
            "integratedRules": ["Exclude R&D <test> accounts", "Scores range 0-100"]
        }"#,
    )
    .unwrap();
    let artifact = export(&report, "scores.py", ExportFormat::Docx).unwrap();
    let xml = document_xml(&artifact.bytes);

    // 3 sources + 1 output + 2 rules
    assert_eq!(xml.matches("• ").count(), 6);
    assert_eq!(xml.matches("<w:tbl>").count(), 2);
    // One header row per table plus one row per column
    let rows = xml.matches("<w:tr>").count() + xml.matches("<w:tr ").count();
    assert_eq!(rows, 4);

    assert!(xml.contains("R&amp;D &lt;test&gt;"));
    assert!(!xml.contains("R&D <test>"));
}

#[test]
fn test_markdown_matches_layout() {
    let report = parse_response(REPORT).unwrap();
    let artifact = export(&report, "call_plans.py", ExportFormat::Markdown).unwrap();
    let text = String::from_utf8(artifact.bytes).unwrap();

    assert!(text.contains("Generated for: call_plans.py"));
    assert!(text.contains("- gold.call_plans: Current plans"));
    assert!(text.contains("### Table: gold.no_columns"));
    assert!(text.contains("| plan_id | string | Plan key | P1 | crm.call_plans | id |"));
    assert!(text.contains("Loads hospital call plans.\nRuns nightly."));
}

#[test]
fn test_render_is_deterministic() {
    let report = parse_response(REPORT).unwrap();
    let first = MarkdownWriter.to_markdown(&render(&report, "a.py"));
    let second = MarkdownWriter.to_markdown(&render(&report, "a.py"));
    assert_eq!(first, second);
}

#[test]
fn test_metadata_section_blocks() {
    let report = parse_response(REPORT).unwrap();
    let doc = render(&report, "a.py");
    let metadata = doc.section("Table Metadata").unwrap();

    let labels: Vec<&str> = metadata
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::SubHeading(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["Table: gold.call_plans", "Table: gold.no_columns"]);

    let tables = metadata.tables();
    assert_eq!(tables[0].rows.len(), 1);
    assert!(tables[1].rows.is_empty());
}

#[test]
fn test_wrongly_typed_fields_render_empty() {
    let report = parse_response(
        r#"{"description": 42, "dataSources": "crm.calls", "tableMetadata": [{"tableName": "t", "columns": {"x": 1}}]}"#,
    )
    .unwrap();
    let doc = render(&report, "a.py");

    assert!(doc.section("Data Sources").unwrap().bullets().is_empty());
    assert!(doc.section("Table Metadata").unwrap().tables()[0]
        .rows
        .is_empty());
}
