use std::sync::Arc;

use crate::db::Store;
use crate::entities::notes;
use crate::models::Capability;
use crate::services::upload::{UploadKind, UploadService};

use super::note_service::{NoteError, NoteService, UploadedFile};
use super::project_service::{AttachmentInfo, NoteInfo};

/// Longest accepted note text, matching the column width.
pub const MAX_NOTE_TEXT_LEN: usize = 1024;

pub struct NoteServiceImpl {
    store: Store,
    uploads: Arc<UploadService>,
}

impl NoteServiceImpl {
    #[must_use]
    pub const fn new(store: Store, uploads: Arc<UploadService>) -> Self {
        Self { store, uploads }
    }

    /// Check the caller's capability on the project the operation targets.
    async fn require_on_project(
        &self,
        caller_id: i32,
        project_id: i32,
        capability: Capability,
    ) -> Result<(), NoteError> {
        if self.store.get_project(project_id).await?.is_none() {
            return Err(NoteError::NotFound(format!("Project {project_id}")));
        }

        let permission = self
            .store
            .permission_of(caller_id, project_id)
            .await?
            .ok_or_else(|| {
                NoteError::PermissionDenied("You are not a member of this project".to_string())
            })?;

        if !permission.allows(capability) {
            return Err(NoteError::PermissionDenied(format!(
                "Your permission level ({permission}) does not allow this action"
            )));
        }

        Ok(())
    }

    /// Resolve a note and authorize against its owning project.
    async fn require_note(
        &self,
        caller_id: i32,
        note_id: i32,
        capability: Capability,
    ) -> Result<notes::Model, NoteError> {
        let note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or_else(|| NoteError::NotFound(format!("Note {note_id}")))?;

        self.require_on_project(caller_id, note.project_id, capability)
            .await?;

        Ok(note)
    }

    fn validate_text(text: &str) -> Result<&str, NoteError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NoteError::Validation("Note text is required".to_string()));
        }
        if text.chars().count() > MAX_NOTE_TEXT_LEN {
            return Err(NoteError::Validation(format!(
                "Note text must be at most {MAX_NOTE_TEXT_LEN} characters"
            )));
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl NoteService for NoteServiceImpl {
    async fn create(
        &self,
        caller_id: i32,
        project_id: i32,
        text: &str,
        files: Vec<UploadedFile>,
    ) -> Result<NoteInfo, NoteError> {
        self.require_on_project(caller_id, project_id, Capability::Write)
            .await?;

        let text = Self::validate_text(text)?;

        // Files land on disk first; if the row transaction then fails the
        // stored files are removed so nothing is left orphaned either way.
        let mut stored_paths = Vec::with_capacity(files.len());
        for file in &files {
            let path = self
                .uploads
                .save(UploadKind::Attachment, &file.filename, &file.bytes)
                .await?;
            stored_paths.push(path);
        }

        let note = match self
            .store
            .create_note_with_attachments(project_id, caller_id, text, &stored_paths)
            .await
        {
            Ok(note) => note,
            Err(e) => {
                self.uploads.delete_all(&stored_paths).await;
                return Err(NoteError::Internal(e.to_string()));
            }
        };

        let attachments = self
            .store
            .note_attachments(note.id)
            .await?
            .into_iter()
            .map(|a| AttachmentInfo {
                id: a.id,
                display_name: a.display_name().to_string(),
                file_path: a.file_path,
            })
            .collect();

        tracing::info!(project_id, note_id = note.id, "Note created");

        Ok(NoteInfo {
            id: note.id,
            text: note.text,
            is_completed: note.is_completed,
            author_id: note.user_id,
            created_at: note.created_at,
            attachments,
        })
    }

    async fn toggle_complete(&self, caller_id: i32, note_id: i32) -> Result<bool, NoteError> {
        self.require_note(caller_id, note_id, Capability::Complete)
            .await?;

        self.store
            .toggle_note_completed(note_id)
            .await?
            .ok_or_else(|| NoteError::NotFound(format!("Note {note_id}")))
    }

    async fn delete(&self, caller_id: i32, note_id: i32) -> Result<(), NoteError> {
        self.require_note(caller_id, note_id, Capability::Delete)
            .await?;

        let attachment_paths: Vec<String> = self
            .store
            .note_attachments(note_id)
            .await?
            .into_iter()
            .map(|a| a.file_path)
            .collect();

        if !self.store.remove_note(note_id).await? {
            return Err(NoteError::NotFound(format!("Note {note_id}")));
        }

        self.uploads.delete_all(&attachment_paths).await;

        tracing::info!(note_id, "Note deleted");

        Ok(())
    }
}
