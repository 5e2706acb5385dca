use std::sync::Arc;

use crate::config::DefaultsConfig;
use crate::db::Store;
use crate::entities::projects;
use crate::models::{Capability, Permission};
use crate::services::upload::UploadService;

use super::project_service::{
    AttachmentInfo, MemberInfo, NoteInfo, ProjectDetail, ProjectError, ProjectService,
    ProjectSummary,
};

/// Longest accepted project name, matching the column width.
pub const MAX_PROJECT_NAME_LEN: usize = 128;

pub struct ProjectServiceImpl {
    store: Store,
    uploads: Arc<UploadService>,
    defaults: DefaultsConfig,
}

impl ProjectServiceImpl {
    #[must_use]
    pub const fn new(store: Store, uploads: Arc<UploadService>, defaults: DefaultsConfig) -> Self {
        Self {
            store,
            uploads,
            defaults,
        }
    }

    /// Resolve the project and check the caller holds the needed capability.
    /// A missing project is a 404-style error; an existing project the
    /// caller has no membership in, or too low a level for, is denied.
    async fn require(
        &self,
        caller_id: i32,
        project_id: i32,
        capability: Capability,
    ) -> Result<projects::Model, ProjectError> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| ProjectError::NotFound(format!("Project {project_id}")))?;

        let permission = self
            .store
            .permission_of(caller_id, project_id)
            .await?
            .ok_or_else(|| {
                ProjectError::PermissionDenied("You are not a member of this project".to_string())
            })?;

        if !permission.allows(capability) {
            return Err(ProjectError::PermissionDenied(format!(
                "Your permission level ({permission}) does not allow this action"
            )));
        }

        Ok(project)
    }

    fn validate_name(name: &str) -> Result<&str, ProjectError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectError::Validation(
                "Project name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(ProjectError::Validation(format!(
                "Project name must be at most {MAX_PROJECT_NAME_LEN} characters"
            )));
        }
        Ok(name)
    }

    fn summary(project: projects::Model) -> ProjectSummary {
        ProjectSummary {
            id: project.id,
            name: project.name,
            image_url: project.image_url,
            is_archived: project.is_archived,
            created_at: project.created_at,
        }
    }
}

#[async_trait::async_trait]
impl ProjectService for ProjectServiceImpl {
    async fn list_active(&self, user_id: i32) -> Result<Vec<ProjectSummary>, ProjectError> {
        let projects = self.store.list_projects_for_user(user_id, false).await?;
        Ok(projects.into_iter().map(Self::summary).collect())
    }

    async fn list_archived(&self, user_id: i32) -> Result<Vec<ProjectSummary>, ProjectError> {
        let projects = self.store.list_projects_for_user(user_id, true).await?;
        Ok(projects.into_iter().map(Self::summary).collect())
    }

    async fn create(
        &self,
        creator_id: i32,
        name: &str,
        image_url: Option<String>,
    ) -> Result<ProjectSummary, ProjectError> {
        let name = Self::validate_name(name)?;

        if self.store.get_project_by_name(name).await?.is_some() {
            return Err(ProjectError::DuplicateName);
        }

        let image_url = image_url.unwrap_or_else(|| self.defaults.project_image_url.clone());

        let project = self.store.create_project(creator_id, name, &image_url).await?;

        tracing::info!(project = %project.name, creator_id, "Project created");

        Ok(Self::summary(project))
    }

    async fn detail(
        &self,
        caller_id: i32,
        project_id: i32,
    ) -> Result<ProjectDetail, ProjectError> {
        let project = self.require(caller_id, project_id, Capability::Read).await?;

        // require() already proved the membership exists.
        let permission = self
            .store
            .permission_of(caller_id, project_id)
            .await?
            .ok_or_else(|| ProjectError::Internal("Membership vanished mid-request".to_string()))?;

        let note_rows = self.store.list_notes_for_project(project_id).await?;
        let is_archiveable =
            !note_rows.is_empty() && note_rows.iter().all(|(note, _)| note.is_completed);

        let notes = note_rows
            .into_iter()
            .map(|(note, files)| NoteInfo {
                id: note.id,
                text: note.text,
                is_completed: note.is_completed,
                author_id: note.user_id,
                created_at: note.created_at,
                attachments: files
                    .into_iter()
                    .map(|a| AttachmentInfo {
                        id: a.id,
                        display_name: a.display_name().to_string(),
                        file_path: a.file_path,
                    })
                    .collect(),
            })
            .collect();

        let members = self
            .store
            .project_members(project_id)
            .await?
            .into_iter()
            .map(|m| MemberInfo {
                user_id: m.user_id,
                username: m.username,
                permission: m.permission,
            })
            .collect();

        Ok(ProjectDetail {
            project: Self::summary(project),
            notes,
            members,
            is_archiveable,
            permission,
        })
    }

    async fn update(
        &self,
        caller_id: i32,
        project_id: i32,
        name: &str,
        image_url: Option<String>,
    ) -> Result<ProjectSummary, ProjectError> {
        let project = self
            .require(caller_id, project_id, Capability::Write)
            .await?;

        let name = Self::validate_name(name)?;

        if let Some(existing) = self.store.get_project_by_name(name).await?
            && existing.id != project_id
        {
            return Err(ProjectError::DuplicateName);
        }

        let image_url = image_url.unwrap_or(project.image_url);

        let updated = self.store.update_project(project_id, name, &image_url).await?;

        Ok(Self::summary(updated))
    }

    async fn delete(&self, caller_id: i32, project_id: i32) -> Result<(), ProjectError> {
        let project = self
            .require(caller_id, project_id, Capability::Delete)
            .await?;

        // Gather stored files before the rows cascade away.
        let attachment_paths = self.store.project_attachment_paths(project_id).await?;

        if !self.store.remove_project(project_id).await? {
            return Err(ProjectError::NotFound(format!("Project {project_id}")));
        }

        self.uploads.delete_all(&attachment_paths).await;

        tracing::info!(project = %project.name, "Project deleted");

        Ok(())
    }

    async fn archive(&self, caller_id: i32, project_id: i32) -> Result<(), ProjectError> {
        let project = self
            .require(caller_id, project_id, Capability::Complete)
            .await?;

        let notes = self.store.list_notes_for_project(project_id).await?;
        let is_archiveable = !notes.is_empty() && notes.iter().all(|(note, _)| note.is_completed);

        if !is_archiveable {
            return Err(ProjectError::Validation(
                "A project can only be archived once it has notes and all of them are completed"
                    .to_string(),
            ));
        }

        self.store.archive_project(project_id).await?;

        tracing::info!(project = %project.name, "Project archived");

        Ok(())
    }

    async fn add_member(
        &self,
        caller_id: i32,
        project_id: i32,
        username: &str,
        permission: Permission,
    ) -> Result<MemberInfo, ProjectError> {
        self.require(caller_id, project_id, Capability::Delete)
            .await?;

        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| ProjectError::NotFound(format!("User '{username}'")))?;

        if self.store.get_membership(user.id, project_id).await?.is_some() {
            return Err(ProjectError::DuplicateMembership);
        }

        match self.store.add_membership(user.id, project_id, permission).await {
            Ok(_) => {}
            // Lost a race into the unique (user, project) index.
            Err(e) if crate::db::is_unique_violation(&e) => {
                return Err(ProjectError::DuplicateMembership);
            }
            Err(e) => return Err(ProjectError::Internal(e.to_string())),
        }

        tracing::info!(project_id, member = %user.username, %permission, "Member added");

        Ok(MemberInfo {
            user_id: user.id,
            username: user.username,
            permission,
        })
    }

    async fn remove_member(
        &self,
        caller_id: i32,
        project_id: i32,
        user_id: i32,
    ) -> Result<(), ProjectError> {
        self.require(caller_id, project_id, Capability::Delete)
            .await?;

        if !self.store.remove_membership(user_id, project_id).await? {
            return Err(ProjectError::NotFound(format!(
                "Membership of user {user_id} in project {project_id}"
            )));
        }

        Ok(())
    }

    async fn leave(&self, caller_id: i32, project_id: i32) -> Result<(), ProjectError> {
        // No capability gate: even read-only members can walk away.
        if !self.store.remove_membership(caller_id, project_id).await? {
            return Err(ProjectError::NotFound(format!(
                "Membership in project {project_id}"
            )));
        }

        tracing::info!(project_id, user_id = caller_id, "Member left project");

        Ok(())
    }
}
