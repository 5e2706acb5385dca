use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::MessageResponse;
use crate::services::{NoteInfo, UploadedFile};

/// POST /projects/{id}/new  (multipart: text, attachment*)
/// Creates a note with zero or more file attachments.
pub async fn new_note(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<NoteInfo>>, ApiError> {
    let mut text = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("text") => {
                text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(format!("Invalid text field: {e}")))?,
                );
            }
            Some("attachment") => {
                let filename = field.file_name().unwrap_or("attachment").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::validation(format!("Invalid attachment upload: {e}"))
                })?;
                if !bytes.is_empty() {
                    files.push(UploadedFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let text = text.ok_or_else(|| ApiError::validation("Note text is required"))?;

    let note = state
        .note_service
        .create(caller.id, project_id, &text, files)
        .await?;

    Ok(Json(ApiResponse::success(note)))
}

/// POST /projects/{id}/complete/{note_id}
/// Flips the note's completion flag and reports the new value.
pub async fn complete_note(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path((_project_id, note_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let is_completed = state.note_service.toggle_complete(caller.id, note_id).await?;

    Ok(Json(ApiResponse::success(is_completed)))
}

/// POST /projects/{id}/delete/{note_id}
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path((_project_id, note_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.note_service.delete(caller.id, note_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Note deleted".to_string(),
    })))
}
