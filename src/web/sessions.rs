//! Session API handlers.
//!
//! Upload, generate (blocking or streamed), display, clear and export, all
//! scoped to one session id.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, warn};

use super::error::{ApiError, ErrorBody};
use super::server::AppState;
use crate::export::{export, ExportFormat};
use crate::generate::{generate, generate_streaming, GeneratedReport};
use crate::session::{SessionId, SessionSnapshot, UploadInfo, UploadedSource};

/// Name used when the browser sends a file part without a filename.
const DEFAULT_UPLOAD_NAME: &str = "upload.py";

/// Shown in place of a report when the session has none.
pub const NO_REPORT_MESSAGE: &str =
    "No documentation generated yet. Upload a Python file and generate.";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response to session creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedSession {
    pub session_id: SessionId,
}

/// Current report of a session.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: Option<GeneratedReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Response to a clear request.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    /// Whether a report was removed.
    pub cleared: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// "docx" (default) or "markdown".
    #[serde(default)]
    pub format: Option<String>,
}

/// Data of a `fragment` event.
#[derive(Debug, Serialize)]
struct FragmentData<'a> {
    text: &'a str,
}

// ============================================================================
// Session Lifecycle
// ============================================================================

/// POST /api/sessions - Create a session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<CreatedSession>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

/// GET /api/sessions/{id} - Session snapshot
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// DELETE /api/sessions/{id} - Drop a session
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> StatusCode {
    if state.sessions.remove(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// ============================================================================
// Upload
// ============================================================================

/// POST /api/sessions/{id}/upload - Store the source file (multipart field `file`)
///
/// The only check is that the content decodes as UTF-8.
pub async fn upload_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    mut multipart: Multipart,
) -> Result<Json<UploadInfo>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_upload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(sanitize_filename)
            .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_upload(e.to_string()))?;
        let content = String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::bad_upload(format!("{filename} is not valid UTF-8 text")))?;

        let info = UploadInfo {
            filename: filename.clone(),
            bytes: content.len(),
        };
        state
            .sessions
            .set_upload(id, UploadedSource::new(filename, content))
            .await?;
        return Ok(Json(info));
    }

    Err(ApiError::bad_upload("missing multipart field \"file\""))
}

/// Keep the last path component of a browser-supplied name.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() {
        DEFAULT_UPLOAD_NAME.to_string()
    } else {
        base.to_string()
    }
}

// ============================================================================
// Generation
// ============================================================================

/// POST /api/sessions/{id}/generate - Generate and wait for the full report
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<GeneratedReport>, ApiError> {
    let upload = state.sessions.begin_generation(id).await?;

    // Run detached so a dropped connection cannot leave the session marked busy.
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        let result = generate(
            task_state.service.as_ref(),
            &upload.content,
            &upload.filename,
            false,
        )
        .await;
        let stored = result.as_ref().ok().cloned();
        if let Err(e) = task_state.sessions.finish_generation(id, stored).await {
            warn!(session = %id, "session ended during generation: {}", e);
        }
        result
    });

    let result = handle.await.map_err(|e| {
        error!("generation task failed: {}", e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
    })?;

    Ok(Json(result?))
}

/// POST /api/sessions/{id}/generate/stream - Generate with server-sent progress
///
/// Emits `fragment` events (`{"text": ...}`) as the model output arrives,
/// then exactly one `done` event carrying the report or one `error` event.
pub async fn generate_report_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let upload = state.sessions.begin_generation(id).await?;
    let (tx, rx) = mpsc::unbounded_channel::<Event>();

    let task_state = state.clone();
    tokio::spawn(async move {
        let fragment_tx = tx.clone();
        let result = generate_streaming(
            task_state.service.as_ref(),
            &upload.content,
            &upload.filename,
            move |fragment| {
                let _ = fragment_tx.send(json_event("fragment", &FragmentData { text: fragment }));
            },
        )
        .await;

        if let Err(e) = task_state
            .sessions
            .finish_generation(id, result.as_ref().ok().cloned())
            .await
        {
            warn!(session = %id, "session ended during generation: {}", e);
        }

        let last = match &result {
            Ok(report) => json_event("done", report),
            Err(e) => json_event("error", &ErrorBody::from(e)),
        };
        let _ = tx.send(last);
    });

    let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn json_event<T: Serialize>(name: &'static str, data: &T) -> Event {
    match Event::default().event(name).json_data(data) {
        Ok(event) => event,
        Err(e) => {
            error!("failed to encode {} event: {}", name, e);
            Event::default().event("error").data("failed to encode event")
        }
    }
}

// ============================================================================
// Display, Clear, Export
// ============================================================================

/// GET /api/sessions/{id}/report - Current report, or the "no report" message
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<ReportResponse>, ApiError> {
    let report = state.sessions.report(id).await?;
    let message = report.is_none().then_some(NO_REPORT_MESSAGE);
    Ok(Json(ReportResponse { report, message }))
}

/// DELETE /api/sessions/{id}/report - Clear the report
pub async fn clear_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<ClearResponse>, ApiError> {
    let cleared = state.sessions.clear(id).await?;
    Ok(Json(ClearResponse { cleared }))
}

/// GET /api/sessions/{id}/export?format=docx - Download the report
pub async fn export_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        Some(f) => f.parse::<ExportFormat>()?,
        None => ExportFormat::default(),
    };

    let generated = state
        .sessions
        .report(id)
        .await?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "session", NO_REPORT_MESSAGE))?;

    let artifact = export(&generated.report, &generated.filename, format)?;

    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&artifact.filename),
            ),
        ],
        artifact.bytes,
    )
        .into_response())
}

/// `attachment` header value with a quoted, ASCII-only filename.
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
