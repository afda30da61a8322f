//! End-to-end pipeline tests against an in-process completion service.

use async_trait::async_trait;
use scriptdoc::export::render;
use scriptdoc::generate::{generate, GenerateError};
use scriptdoc::llm::{Completion, CompletionService, FragmentStream, LlmError, LlmResult};
use scriptdoc::prompt::{build_messages, PromptPair};
use scriptdoc::session::SessionStore;

const WELL_FORMED: &str = r#"{
    "description": "Builds a weekly summary of rep visits to hospitals.",
    "tableGrain": "rep_id, hospital_id, week_start",
    "dataSources": ["crm.visits", "crm.reps", "ref.hospitals"],
    "databricksTables": [
        {"tableName": "gold.rep_weekly_visits", "description": "Weekly visit counts"},
        {"tableName": "gold.rep_coverage", "description": "Hospital coverage per rep"}
    ],
    "tableMetadata": [
        {
            "tableName": "gold.rep_weekly_visits",
            "columns": [
                {"columnName": "rep_id", "dataType": "string", "description": "Rep key",
                 "sampleValues": "R001, R002", "sourceTable": "crm.reps", "sourceColumn": "id"},
                {"columnName": "visits", "dataType": "int", "description": "Visits in the week",
                 "sampleValues": "3, 7", "sourceTable": "crm.visits", "sourceColumn": "visit_id"}
            ]
        },
        {
            "tableName": "gold.rep_coverage",
            "columns": [
                {"columnName": "hospital_id", "dataType": "string", "description": "Hospital key",
                 "sampleValues": "H10", "sourceTable": "ref.hospitals", "sourceColumn": "id"}
            ]
        }
    ],
    "integratedRules": ["Drop cancelled visits", "Weeks start on Monday"]
}"#;

/// Replies with fixed text, split into fragments when streaming.
struct FixedModel {
    text: String,
}

impl FixedModel {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl CompletionService for FixedModel {
    fn model(&self) -> &str {
        "fixed"
    }

    async fn complete(&self, _prompt: &PromptPair) -> LlmResult<String> {
        Ok(self.text.clone())
    }

    async fn stream(&self, _prompt: &PromptPair) -> LlmResult<FragmentStream> {
        let fragments: Vec<String> = self
            .text
            .as_bytes()
            .chunks(17)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        Ok(FragmentStream::from_fragments(fragments))
    }
}

/// Always fails before producing any output.
struct Unreachable;

#[async_trait]
impl CompletionService for Unreachable {
    fn model(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _prompt: &PromptPair) -> LlmResult<String> {
        Err(LlmError::status(503, "service unavailable"))
    }

    async fn stream(&self, _prompt: &PromptPair) -> LlmResult<FragmentStream> {
        Err(LlmError::status(503, "service unavailable"))
    }
}

#[tokio::test]
async fn test_rendering_counts_match_report() {
    let model = FixedModel::new(WELL_FORMED);
    let generated = generate(&model, "print('hi')", "rep_weekly.py", false)
        .await
        .unwrap();
    let doc = render(&generated.report, &generated.filename);

    assert_eq!(doc.section("Data Sources").unwrap().bullets().len(), 3);
    assert_eq!(doc.section("Integrated Rules").unwrap().bullets().len(), 2);
    assert_eq!(
        doc.section("Databricks Tables (Output)").unwrap().bullets(),
        vec![
            "gold.rep_weekly_visits: Weekly visit counts",
            "gold.rep_coverage: Hospital coverage per rep"
        ]
    );

    let tables = doc.section("Table Metadata").unwrap().tables();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].rows.len(), 2);
    assert_eq!(tables[1].rows.len(), 1);
    assert_eq!(
        tables[0].rows[1],
        vec!["visits", "int", "Visits in the week", "3, 7", "crm.visits", "visit_id"]
    );
    assert!(generated.warnings.is_empty());
}

#[tokio::test]
async fn test_streamed_and_blocking_agree() {
    let model = FixedModel::new(WELL_FORMED);

    let blocking = generate(&model, "x = 1", "job.py", false).await.unwrap();
    let streamed = generate(&model, "x = 1", "job.py", true).await.unwrap();

    assert_eq!(blocking.report, streamed.report);
    assert_eq!(blocking.raw, streamed.raw);
}

#[tokio::test]
async fn test_request_modes_yield_same_text() {
    let model = FixedModel::new(WELL_FORMED);
    let prompt = build_messages("x = 1", "job.py");

    let full = model.request(&prompt, false).await.unwrap();
    assert!(matches!(full, Completion::Full(_)));
    let streamed = model.request(&prompt, true).await.unwrap();
    assert!(matches!(streamed, Completion::Stream(_)));

    assert_eq!(
        full.into_text().await.unwrap(),
        streamed.into_text().await.unwrap()
    );
}

#[tokio::test]
async fn test_malformed_output_is_a_parse_failure() {
    let truncated = &WELL_FORMED[..WELL_FORMED.len() / 2];
    for raw in [truncated, r#"{"description": "x",}"#] {
        let model = FixedModel::new(raw);
        let err = generate(&model, "x = 1", "job.py", false)
            .await
            .unwrap_err();

        match err {
            GenerateError::Parse(e) => assert_eq!(e.raw(), raw),
            other => panic!("expected parse failure, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_transport_failure_is_not_a_parse_failure() {
    let err = generate(&Unreachable, "x = 1", "job.py", true)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "transport");
    assert!(err.raw().is_none());
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_table_without_columns_renders_empty_body() {
    let model = FixedModel::new(
        r#"{"databricksTables": [{"tableName": "gold.t", "description": "d"}],
            "tableMetadata": [{"tableName": "gold.t"}]}"#,
    );
    let generated = generate(&model, "x = 1", "job.py", false).await.unwrap();
    let doc = render(&generated.report, "job.py");

    let tables = doc.section("Table Metadata").unwrap().tables();
    assert_eq!(tables.len(), 1);
    assert!(tables[0].rows.is_empty());
    // Missing top-level keys are tolerated silently
    assert!(generated.warnings.is_empty());
}

#[tokio::test]
async fn test_unlisted_metadata_table_is_warned() {
    let model = FixedModel::new(
        r#"{"databricksTables": [], "tableMetadata": [{"tableName": "gold.orphan", "columns": []}]}"#,
    );
    let generated = generate(&model, "x = 1", "job.py", false).await.unwrap();

    assert!(generated
        .warnings
        .iter()
        .any(|w| w.contains("gold.orphan")));
}

#[tokio::test]
async fn test_filename_is_kept_with_report() {
    let model = FixedModel::new(WELL_FORMED);
    let generated = generate(&model, "x = 1", "weekly_visits.py", false)
        .await
        .unwrap();

    assert_eq!(generated.filename, "weekly_visits.py");
    assert_eq!(
        render(&generated.report, &generated.filename).subtitle,
        "Generated for: weekly_visits.py"
    );
}

#[tokio::test]
async fn test_clear_returns_session_to_no_report() {
    let store = SessionStore::new();
    let id = store.create().await;
    let model = FixedModel::new(WELL_FORMED);

    let generated = generate(&model, "x = 1", "job.py", false).await.unwrap();
    store.replace(id, generated).await.unwrap();
    assert!(store.report(id).await.unwrap().is_some());

    assert!(store.clear(id).await.unwrap());
    let snapshot = store.snapshot(id).await.unwrap();
    assert!(snapshot.report.is_none());

    // A second clear has nothing to remove
    assert!(!store.clear(id).await.unwrap());
}
