//! # scriptdoc
//!
//! Business-facing documentation for Python data pipeline scripts, written
//! by a chat completion model and exported as Word or Markdown.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Uploaded Python source                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [prompt]
//! ┌─────────────────────────────────────────────────────────┐
//! │        System + user messages (template embedded)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [llm]  blocking or streamed
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Raw model text (JSON)                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  DocumentationReport                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [export]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  .docx / .md download                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`generate`] ties the first three stages together; [`session`] keeps the
//! per-user state the web UI works against.

pub mod config;
pub mod export;
pub mod generate;
pub mod llm;
pub mod prompt;
pub mod report;
pub mod session;

#[cfg(feature = "ui")]
pub mod web;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::export::{export, export_filename, ExportArtifact, ExportFormat};
    pub use crate::generate::{generate, generate_streaming, GenerateError, GeneratedReport};
    pub use crate::llm::{CompletionService, DocumentationClient, LlmError};
    pub use crate::prompt::build_messages;
    pub use crate::report::{parse_response, DocumentationReport};
    pub use crate::session::{SessionId, SessionStore};
}
