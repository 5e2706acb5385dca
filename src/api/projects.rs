use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{AddMemberRequest, MessageResponse};
use crate::services::{MemberInfo, ProjectDetail, ProjectSummary, UploadKind};

/// Fields accepted by the project create/update multipart forms: a required
/// name plus at most one of an uploaded image or an external image URL.
struct ProjectForm {
    name: String,
    image_url: Option<String>,
}

async fn read_project_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<ProjectForm, ApiError> {
    let mut name = None;
    let mut image_url = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("name") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(format!("Invalid name field: {e}")))?,
                );
            }
            Some("image_url") => {
                let url = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid image_url field: {e}")))?;
                if !url.trim().is_empty() {
                    image_url = Some(url.trim().to_string());
                }
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or("cover").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid image upload: {e}")))?;
                if !bytes.is_empty() {
                    let stored = state
                        .uploads
                        .save(UploadKind::ProjectImage, &filename, &bytes)
                        .await?;
                    image_url = Some(format!("/uploads/{stored}"));
                }
            }
            _ => {}
        }
    }

    Ok(ProjectForm {
        name: name.ok_or_else(|| ApiError::validation("Project name is required"))?,
        image_url,
    })
}

/// GET /projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<ProjectSummary>>>, ApiError> {
    let projects = state.project_service.list_active(caller.id).await?;

    Ok(Json(ApiResponse::success(projects)))
}

/// GET /projects/archived
pub async fn list_archived_projects(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<ProjectSummary>>>, ApiError> {
    let projects = state.project_service.list_archived(caller.id).await?;

    Ok(Json(ApiResponse::success(projects)))
}

/// POST /projects/new  (multipart: name, image | image_url)
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ProjectSummary>>, ApiError> {
    let form = read_project_form(&state, multipart).await?;

    let project = state
        .project_service
        .create(caller.id, &form.name, form.image_url)
        .await?;

    Ok(Json(ApiResponse::success(project)))
}

/// GET /projects/{id}
pub async fn project_details(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
) -> Result<Json<ApiResponse<ProjectDetail>>, ApiError> {
    let detail = state.project_service.detail(caller.id, project_id).await?;

    Ok(Json(ApiResponse::success(detail)))
}

/// GET /projects/{id}/settings
/// Same payload as the detail view; the member list drives the settings UI.
pub async fn project_settings(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
) -> Result<Json<ApiResponse<ProjectDetail>>, ApiError> {
    let detail = state.project_service.detail(caller.id, project_id).await?;

    Ok(Json(ApiResponse::success(detail)))
}

/// POST /projects/{id}/settings  (multipart: name, image | image_url)
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ProjectSummary>>, ApiError> {
    let form = read_project_form(&state, multipart).await?;

    let project = state
        .project_service
        .update(caller.id, project_id, &form.name, form.image_url)
        .await?;

    Ok(Json(ApiResponse::success(project)))
}

/// POST /projects/delete/{id}
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.project_service.delete(caller.id, project_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Project deleted".to_string(),
    })))
}

/// POST /projects/{id}/archive
pub async fn archive_project(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.project_service.archive(caller.id, project_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Project archived".to_string(),
    })))
}

/// POST /projects/{id}/settings/add_user
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<Json<ApiResponse<MemberInfo>>, ApiError> {
    let member = state
        .project_service
        .add_member(caller.id, project_id, &payload.username, payload.permission)
        .await?;

    Ok(Json(ApiResponse::success(member)))
}

/// POST /projects/{id}/settings/remove_user/{user_id}
pub async fn remove_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path((project_id, user_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .project_service
        .remove_member(caller.id, project_id, user_id)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Member removed".to_string(),
    })))
}

/// POST /projects/{id}/leave
pub async fn leave_project(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.project_service.leave(caller.id, project_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Left project".to_string(),
    })))
}
