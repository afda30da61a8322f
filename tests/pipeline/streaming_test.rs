//! Upstream protocol tests against a mocked chat completions endpoint.

use std::time::Duration;

use mockito::{Matcher, Server};
use scriptdoc::generate::{generate, generate_streaming, GenerateError};
use scriptdoc::llm::{CompletionService, DocumentationClient, LlmError};
use scriptdoc::prompt::build_messages;
use serde_json::json;

const REPORT: &str = r#"{"description": "Joins visits to reps.", "tableGrain": "visit_id", "dataSources": ["crm.visits", "crm.reps"], "databricksTables": [{"tableName": "gold.visits", "description": "Enriched visits"}], "tableMetadata": [{"tableName": "gold.visits", "columns": [{"columnName": "visit_id", "dataType": "bigint", "description": "Visit key", "sampleValues": "1, 2", "sourceTable": "crm.visits", "sourceColumn": "id"}]}], "integratedRules": ["Only completed visits"]}"#;

fn client_for(server: &Server) -> DocumentationClient {
    DocumentationClient::new(
        &server.url(),
        "o3-2025-04-16",
        "test-api-key",
        Duration::from_secs(10),
    )
    .unwrap()
}

fn blocking_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// An event-stream body that delivers `content` in `size`-byte deltas.
fn sse_body(content: &str, size: usize) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "data: {}\n\n",
        json!({"choices": [{"delta": {"role": "assistant"}}]})
    ));
    for piece in content.as_bytes().chunks(size) {
        let piece = std::str::from_utf8(piece).unwrap();
        body.push_str(&format!(
            "data: {}\n\n",
            json!({"choices": [{"delta": {"content": piece}}]})
        ));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

#[tokio::test]
async fn test_blocking_request_shape() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-api-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "o3-2025-04-16",
            "response_format": {"type": "json_object"},
            "stream": false
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(blocking_body(REPORT))
        .create_async()
        .await;

    let client = client_for(&server);
    let text = client
        .complete(&build_messages("x = 1", "job.py"))
        .await
        .unwrap();

    assert_eq!(text, REPORT);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_streamed_fragments_parse_like_blocking() {
    let mut server = Server::new_async().await;

    let _blocking = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({"stream": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(blocking_body(REPORT))
        .create_async()
        .await;

    let _streamed = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({"stream": true})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(REPORT, 23))
        .create_async()
        .await;

    let client = client_for(&server);

    let blocking = generate(&client, "x = 1", "visits.py", false)
        .await
        .unwrap();

    let mut fragments = Vec::new();
    let streamed = generate_streaming(&client, "x = 1", "visits.py", |f| {
        fragments.push(f.to_string())
    })
    .await
    .unwrap();

    assert!(fragments.len() > 1);
    assert_eq!(fragments.concat(), REPORT);
    assert_eq!(blocking.report, streamed.report);
    assert_eq!(streamed.report.data_sources(), vec!["crm.visits", "crm.reps"]);
}

#[tokio::test]
async fn test_crlf_event_stream() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(REPORT, 40).replace("\n\n", "\r\n\r\n"))
        .create_async()
        .await;

    let client = client_for(&server);
    let text = client
        .stream(&build_messages("x = 1", "job.py"))
        .await
        .unwrap()
        .collect_text()
        .await
        .unwrap();

    assert_eq!(text, REPORT);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .complete(&build_messages("x = 1", "job.py"))
        .await
        .unwrap_err();

    match err {
        LlmError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_event_mid_stream_discards_partial_output() {
    let mut server = Server::new_async().await;

    let mut body = String::new();
    for piece in ["{\"descr", "iption\": "] {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({"choices": [{"delta": {"content": piece}}]})
        ));
    }
    body.push_str(&format!(
        "data: {}\n\n",
        json!({"error": {"message": "The server had an error while processing your request"}})
    ));

    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client = client_for(&server);
    let mut seen = 0;
    let err = generate_streaming(&client, "x = 1", "job.py", |_| seen += 1)
        .await
        .unwrap_err();

    assert_eq!(seen, 2);
    match err {
        GenerateError::Transport(e) => {
            assert!(e.is_mid_stream());
            assert!(e.to_string().contains("processing your request"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_streamed_malformed_json_keeps_raw_text() {
    let mut server = Server::new_async().await;
    let truncated = &REPORT[..80];

    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(truncated, 16))
        .create_async()
        .await;

    let client = client_for(&server);
    let err = generate(&client, "x = 1", "job.py", true).await.unwrap_err();

    assert_eq!(err.kind(), "parse");
    assert_eq!(err.raw(), Some(truncated));
}
