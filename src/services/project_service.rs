//! Domain service for project lifecycle and membership.
//!
//! Every mutating operation checks the caller's permission level against the
//! capability it needs before touching the store; the membership table is the
//! single authority source for access decisions.

use serde::Serialize;
use thiserror::Error;

use crate::models::Permission;

/// Errors specific to project and membership operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("A project with that name already exists")]
    DuplicateName,

    #[error("This user has already been added")]
    DuplicateMembership,

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

impl From<sea_orm::DbErr> for ProjectError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProjectError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            // Raced a concurrent writer into the unique index; surface the
            // domain kind rather than the constraint fault.
            Self::DuplicateName
        } else {
            Self::Internal(err.to_string())
        }
    }
}

/// Project row shaped for list responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: i32,
    pub name: String,
    pub image_url: String,
    pub is_archived: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberInfo {
    pub user_id: i32,
    pub username: String,
    pub permission: Permission,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentInfo {
    pub id: i32,
    /// Path under /uploads for retrieval.
    pub file_path: String,
    /// Original filename for display.
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteInfo {
    pub id: i32,
    pub text: String,
    pub is_completed: bool,
    pub author_id: Option<i32>,
    pub created_at: String,
    pub attachments: Vec<AttachmentInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ProjectSummary,
    pub notes: Vec<NoteInfo>,
    pub members: Vec<MemberInfo>,
    /// Advisory-turned-precondition: true when the project has at least one
    /// note and every note is completed.
    pub is_archiveable: bool,
    /// The caller's own permission level on this project.
    pub permission: Permission,
}

/// Domain service trait for project lifecycle and membership.
#[async_trait::async_trait]
pub trait ProjectService: Send + Sync {
    /// Projects where the caller holds a membership and the archive flag is
    /// unset, in membership insertion order.
    async fn list_active(&self, user_id: i32) -> Result<Vec<ProjectSummary>, ProjectError>;

    /// Symmetric filter for archived projects.
    async fn list_archived(&self, user_id: i32) -> Result<Vec<ProjectSummary>, ProjectError>;

    /// Creates a project and the creator's delete-level membership together.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::DuplicateName`] if the name is taken anywhere
    /// in the system, regardless of creator.
    async fn create(
        &self,
        creator_id: i32,
        name: &str,
        image_url: Option<String>,
    ) -> Result<ProjectSummary, ProjectError>;

    /// Project with its notes, attachments and members. Requires the `read`
    /// capability.
    async fn detail(&self, caller_id: i32, project_id: i32)
    -> Result<ProjectDetail, ProjectError>;

    /// Renames and/or re-images the project. Requires `write`; the global
    /// uniqueness rule applies, excluding the project's own current name.
    async fn update(
        &self,
        caller_id: i32,
        project_id: i32,
        name: &str,
        image_url: Option<String>,
    ) -> Result<ProjectSummary, ProjectError>;

    /// Unconditional cascade delete of the project, its notes, their
    /// attachments (rows and stored files) and all memberships. Requires
    /// `delete`.
    async fn delete(&self, caller_id: i32, project_id: i32) -> Result<(), ProjectError>;

    /// One-way transition to `is_archived = true`. Requires `complete` and
    /// an archiveable project (at least one note, all completed); there is
    /// no unarchive.
    async fn archive(&self, caller_id: i32, project_id: i32) -> Result<(), ProjectError>;

    /// Adds a member by username. Requires `delete` on the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::DuplicateMembership`] if the user already
    /// holds a membership in the project.
    async fn add_member(
        &self,
        caller_id: i32,
        project_id: i32,
        username: &str,
        permission: Permission,
    ) -> Result<MemberInfo, ProjectError>;

    /// Removes a member. Requires `delete` on the caller.
    async fn remove_member(
        &self,
        caller_id: i32,
        project_id: i32,
        user_id: i32,
    ) -> Result<(), ProjectError>;

    /// Removes the caller's own membership; any level may leave.
    async fn leave(&self, caller_id: i32, project_id: i32) -> Result<(), ProjectError>;
}
