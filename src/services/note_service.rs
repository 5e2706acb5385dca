//! Domain service for the note lifecycle inside a project.

use thiserror::Error;

use super::project_service::NoteInfo;

/// Errors specific to note operations.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for NoteError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for NoteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// An uploaded file still in memory, as pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Domain service trait for notes and their attachments.
#[async_trait::async_trait]
pub trait NoteService: Send + Sync {
    /// Creates an open note plus one attachment per uploaded file. The note
    /// and all attachment rows commit in a single transaction; files already
    /// written to disk are cleaned up if that transaction fails. Requires
    /// the `write` capability on the project.
    async fn create(
        &self,
        caller_id: i32,
        project_id: i32,
        text: &str,
        files: Vec<UploadedFile>,
    ) -> Result<NoteInfo, NoteError>;

    /// Flips `is_completed`; applying it twice restores the original value.
    /// Requires `complete`.
    async fn toggle_complete(&self, caller_id: i32, note_id: i32) -> Result<bool, NoteError>;

    /// Deletes the note, its attachment rows and their stored files, leaving
    /// the project and sibling notes untouched. Requires `delete`.
    async fn delete(&self, caller_id: i32, note_id: i32) -> Result<(), NoteError>;
}
