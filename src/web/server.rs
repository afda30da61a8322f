//! Axum web server for the scriptdoc UI
//!
//! Serves the embedded page and the session API.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_embed::RustEmbed;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Settings;
use crate::llm::CompletionService;
use crate::session::SessionStore;

use super::sessions;

/// Embedded static files for the UI
#[derive(RustEmbed)]
#[folder = "ui/"]
struct Assets;

/// Application state shared across handlers
pub struct AppState {
    pub settings: Settings,
    /// Completion service used for every generation.
    pub service: Arc<dyn CompletionService>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(settings: Settings, service: Arc<dyn CompletionService>) -> Self {
        Self {
            settings,
            service,
            sessions: SessionStore::new(),
        }
    }
}

/// Build the axum router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.settings.server.max_upload_bytes;

    Router::new()
        .route("/api/health", get(health))
        // Session routes
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/{id}/upload", post(sessions::upload_source))
        .route("/api/sessions/{id}/generate", post(sessions::generate_report))
        .route(
            "/api/sessions/{id}/generate/stream",
            post(sessions::generate_report_stream),
        )
        .route(
            "/api/sessions/{id}/report",
            get(sessions::get_report).delete(sessions::clear_report),
        )
        .route("/api/sessions/{id}/export", get(sessions::export_report))
        // Static files (SPA fallback)
        .fallback(static_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Start the web server
pub async fn serve(
    settings: Settings,
    service: Arc<dyn CompletionService>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = settings.bind_addr();
    let open_browser = settings.server.open_browser;
    let port = settings.server.port;

    let state = Arc::new(AppState::new(settings, service));
    let model = state.service.model().to_string();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, model = %model, "server listening");

    println!("📄 scriptdoc");
    println!("   URL: http://localhost:{}", port);
    println!("   Model: {}", model);
    println!();
    println!("   Press Ctrl+C to stop");

    if open_browser {
        let _ = open::that(format!("http://localhost:{}", port));
    }

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub sessions: usize,
}

/// GET /api/health - Liveness and configured model
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.service.model().to_string(),
        sessions: state.sessions.len().await,
    })
}

// ============================================================================
// Static File Handler
// ============================================================================

/// Serve static files with SPA fallback
async fn static_handler(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    if path.starts_with("api/") {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let (path, content) = match Assets::get(path) {
        Some(content) => (path, content),
        None => match Assets::get("index.html") {
            Some(content) => ("index.html", content),
            None => return (StatusCode::NOT_FOUND, "Not found").into_response(),
        },
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        content.data.into_owned(),
    )
        .into_response()
}
