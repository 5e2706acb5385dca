use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::project::Member;
pub use repositories::user::User;

use crate::config::SecurityConfig;
use crate::entities::{attachments, notes, profiles, projects, project_users};
use crate::models::Permission;

/// Whether an error is a unique-index violation bubbling up from SQLite.
/// Racing writers lose with this rather than a domain error, so callers map
/// it back to the matching duplicate kind.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sea_orm::DbErr>()
        .and_then(sea_orm::DbErr::sql_err)
        .is_some_and(|e| matches!(e, sea_orm::SqlErr::UniqueConstraintViolation(_)))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn project_repo(&self) -> repositories::project::ProjectRepository {
        repositories::project::ProjectRepository::new(self.conn.clone())
    }

    fn membership_repo(&self) -> repositories::membership::MembershipRepository {
        repositories::membership::MembershipRepository::new(self.conn.clone())
    }

    fn note_repo(&self) -> repositories::note::NoteRepository {
        repositories::note::NoteRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Users & profiles
    // ------------------------------------------------------------------

    pub async fn create_user_with_profile(
        &self,
        username: &str,
        email: &str,
        password: &str,
        default_color: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create_with_profile(username, email, password, default_color, security)
            .await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, security)
            .await
    }

    pub async fn update_user_email(&self, user_id: i32, email: &str) -> Result<()> {
        self.user_repo().update_email(user_id, email).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn get_profile(&self, user_id: i32) -> Result<Option<profiles::Model>> {
        self.user_repo().get_profile(user_id).await
    }

    pub async fn update_profile_color(&self, user_id: i32, color: &str) -> Result<()> {
        self.user_repo().update_profile_color(user_id, color).await
    }

    // ------------------------------------------------------------------
    // Projects & memberships
    // ------------------------------------------------------------------

    pub async fn create_project(
        &self,
        creator_id: i32,
        name: &str,
        image_url: &str,
    ) -> Result<projects::Model> {
        self.project_repo().create(creator_id, name, image_url).await
    }

    pub async fn get_project(&self, id: i32) -> Result<Option<projects::Model>> {
        self.project_repo().get(id).await
    }

    pub async fn get_project_by_name(&self, name: &str) -> Result<Option<projects::Model>> {
        self.project_repo().get_by_name(name).await
    }

    pub async fn list_projects_for_user(
        &self,
        user_id: i32,
        archived: bool,
    ) -> Result<Vec<projects::Model>> {
        self.project_repo().list_for_user(user_id, archived).await
    }

    pub async fn update_project(
        &self,
        id: i32,
        name: &str,
        image_url: &str,
    ) -> Result<projects::Model> {
        self.project_repo().update(id, name, image_url).await
    }

    pub async fn archive_project(&self, id: i32) -> Result<()> {
        self.project_repo().set_archived(id).await
    }

    pub async fn remove_project(&self, id: i32) -> Result<bool> {
        self.project_repo().remove(id).await
    }

    pub async fn project_members(&self, project_id: i32) -> Result<Vec<Member>> {
        self.project_repo().members(project_id).await
    }

    pub async fn get_membership(
        &self,
        user_id: i32,
        project_id: i32,
    ) -> Result<Option<project_users::Model>> {
        self.membership_repo().get(user_id, project_id).await
    }

    pub async fn permission_of(
        &self,
        user_id: i32,
        project_id: i32,
    ) -> Result<Option<Permission>> {
        self.membership_repo()
            .permission_of(user_id, project_id)
            .await
    }

    pub async fn add_membership(
        &self,
        user_id: i32,
        project_id: i32,
        permission: Permission,
    ) -> Result<project_users::Model> {
        self.membership_repo()
            .add(user_id, project_id, permission)
            .await
    }

    pub async fn remove_membership(&self, user_id: i32, project_id: i32) -> Result<bool> {
        self.membership_repo().remove(user_id, project_id).await
    }

    // ------------------------------------------------------------------
    // Notes & attachments
    // ------------------------------------------------------------------

    pub async fn create_note_with_attachments(
        &self,
        project_id: i32,
        user_id: i32,
        text: &str,
        file_paths: &[String],
    ) -> Result<notes::Model> {
        self.note_repo()
            .create_with_attachments(project_id, user_id, text, file_paths)
            .await
    }

    pub async fn get_note(&self, id: i32) -> Result<Option<notes::Model>> {
        self.note_repo().get(id).await
    }

    pub async fn list_notes_for_project(
        &self,
        project_id: i32,
    ) -> Result<Vec<(notes::Model, Vec<attachments::Model>)>> {
        self.note_repo().list_for_project(project_id).await
    }

    pub async fn toggle_note_completed(&self, id: i32) -> Result<Option<bool>> {
        self.note_repo().toggle_completed(id).await
    }

    pub async fn note_attachments(&self, note_id: i32) -> Result<Vec<attachments::Model>> {
        self.note_repo().attachments_of(note_id).await
    }

    pub async fn project_attachment_paths(&self, project_id: i32) -> Result<Vec<String>> {
        self.note_repo().attachment_paths_for_project(project_id).await
    }

    pub async fn remove_note(&self, id: i32) -> Result<bool> {
        self.note_repo().remove(id).await
    }
}
