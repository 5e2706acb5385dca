use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};

use crate::entities::project_users;
use crate::models::Permission;

pub struct MembershipRepository {
    conn: DatabaseConnection,
}

impl MembershipRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, user_id: i32, project_id: i32) -> Result<Option<project_users::Model>> {
        project_users::Entity::find()
            .filter(project_users::Column::UserId.eq(user_id))
            .filter(project_users::Column::ProjectId.eq(project_id))
            .one(&self.conn)
            .await
            .context("Failed to query membership")
    }

    /// Permission the user holds on the project, if any. This is the single
    /// authority source for access decisions.
    pub async fn permission_of(&self, user_id: i32, project_id: i32) -> Result<Option<Permission>> {
        let membership = self.get(user_id, project_id).await?;
        Ok(membership.and_then(|m| Permission::parse(&m.permission)))
    }

    /// Insert a membership row. The unique (user, project) index rejects
    /// duplicates; callers map that violation to a domain error.
    pub async fn add(
        &self,
        user_id: i32,
        project_id: i32,
        permission: Permission,
    ) -> Result<project_users::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let membership = project_users::ActiveModel {
            user_id: Set(user_id),
            project_id: Set(project_id),
            permission: Set(permission.as_str().to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(membership)
    }

    /// Delete the (user, project) membership. Returns whether one existed.
    pub async fn remove(&self, user_id: i32, project_id: i32) -> Result<bool> {
        let Some(membership) = self.get(user_id, project_id).await? else {
            return Ok(false);
        };

        membership
            .delete(&self.conn)
            .await
            .context("Failed to delete membership")?;

        Ok(true)
    }
}
