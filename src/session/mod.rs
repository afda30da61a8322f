//! Per-session UI state.
//!
//! A session holds the most recently uploaded file and at most one
//! generated report. State lives only in memory and is never persisted.
//!
//! ```text
//!            begin_generation              finish_generation(Some)
//!  ┌───────┐ ───────────────► ┌──────────┐ ──────────────────────► ┌───────────┐
//!  │ empty │                  │generating│                         │ populated │
//!  └───────┘ ◄─────────────── └──────────┘                         └───────────┘
//!      ▲      finish_generation(None)                                    │
//!      └─────────────────────────── clear / begin_generation ────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::generate::GeneratedReport;

/// Identifier handed to the browser when a session is created.
pub type SessionId = Uuid;

/// Errors from session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("no file has been uploaded")]
    NoUpload,

    #[error("a generation is already running for this session")]
    GenerationInProgress,
}

pub type SessionResult<T> = Result<T, SessionError>;

// ============================================================================
// Session Data
// ============================================================================

/// A source file received from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedSource {
    pub filename: String,
    pub content: String,
}

impl UploadedSource {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// State of one session.
#[derive(Debug, Default)]
pub struct Session {
    upload: Option<UploadedSource>,
    report: Option<GeneratedReport>,
    generating: bool,
}

/// Summary of an uploaded file, without its content.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadInfo {
    pub filename: String,
    pub bytes: usize,
}

/// Read-only copy of a session for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub upload: Option<UploadInfo>,
    pub report: Option<GeneratedReport>,
    pub generating: bool,
}

// ============================================================================
// Store
// ============================================================================

/// All live sessions, keyed by id.
///
/// Cloning is cheap; clones share the same sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session.
    pub async fn create(&self) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, Session::default());
        info!(session = %id, "session created");
        id
    }

    /// Drop a session. Returns `false` if it did not exist.
    pub async fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session = %id, "session removed");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Copy of the session's visible state.
    pub async fn snapshot(&self, id: SessionId) -> SessionResult<SessionSnapshot> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        Ok(SessionSnapshot {
            session_id: id,
            upload: session.upload.as_ref().map(|u| UploadInfo {
                filename: u.filename.clone(),
                bytes: u.content.len(),
            }),
            report: session.report.clone(),
            generating: session.generating,
        })
    }

    /// The current report, if any.
    pub async fn report(&self, id: SessionId) -> SessionResult<Option<GeneratedReport>> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        Ok(session.report.clone())
    }

    /// Store an uploaded file, replacing any earlier upload.
    ///
    /// The current report is left alone until the next generation starts.
    pub async fn set_upload(&self, id: SessionId, upload: UploadedSource) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        debug!(
            session = %id,
            filename = %upload.filename,
            bytes = upload.content.len(),
            "upload stored"
        );
        session.upload = Some(upload);
        Ok(())
    }

    /// Mark the session busy and hand out the file to document.
    ///
    /// The previous report is discarded here, so a failed generation leaves
    /// the session empty rather than showing stale output.
    pub async fn begin_generation(&self, id: SessionId) -> SessionResult<UploadedSource> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;

        if session.generating {
            return Err(SessionError::GenerationInProgress);
        }
        let upload = session.upload.clone().ok_or(SessionError::NoUpload)?;

        session.generating = true;
        session.report = None;
        debug!(session = %id, filename = %upload.filename, "generation started");
        Ok(upload)
    }

    /// Mark the session idle, storing the result of a successful generation.
    pub async fn finish_generation(
        &self,
        id: SessionId,
        result: Option<GeneratedReport>,
    ) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.generating = false;
        if let Some(report) = result {
            info!(session = %id, filename = %report.filename, "report stored");
            session.report = Some(report);
        }
        Ok(())
    }

    /// Store a report, replacing the previous one.
    pub async fn replace(&self, id: SessionId, report: GeneratedReport) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.report = Some(report);
        Ok(())
    }

    /// Remove the report and its filename. Returns whether there was one.
    pub async fn clear(&self, id: SessionId) -> SessionResult<bool> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        let had_report = session.report.take().is_some();
        if had_report {
            info!(session = %id, "report cleared");
        }
        Ok(had_report)
    }
}
