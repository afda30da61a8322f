//! Web server module for the scriptdoc UI
//!
//! Provides an embedded page plus a JSON/SSE API over per-session state.

mod error;
mod server;
mod sessions;

pub use error::{ApiError, ErrorBody};
pub use server::{router, serve, AppState, HealthResponse};
pub use sessions::{
    ClearResponse, CreatedSession, ExportQuery, ReportResponse, NO_REPORT_MESSAGE,
};
