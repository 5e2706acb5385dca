use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::{project_users, projects, users};
use crate::models::Permission;

/// Project member joined with its user row for display.
#[derive(Debug, Clone)]
pub struct Member {
    pub membership_id: i32,
    pub user_id: i32,
    pub username: String,
    pub permission: Permission,
}

pub struct ProjectRepository {
    conn: DatabaseConnection,
}

impl ProjectRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a project together with its creator's membership. Both rows
    /// commit or neither does; a project must never exist memberless.
    pub async fn create(
        &self,
        creator_id: i32,
        name: &str,
        image_url: &str,
    ) -> Result<projects::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let project = projects::ActiveModel {
            name: Set(name.to_string()),
            creator_id: Set(Some(creator_id)),
            image_url: Set(image_url.to_string()),
            is_archived: Set(false),
            created_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        project_users::ActiveModel {
            user_id: Set(creator_id),
            project_id: Set(project.id),
            permission: Set(Permission::Delete.as_str().to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(project)
    }

    pub async fn get(&self, id: i32) -> Result<Option<projects::Model>> {
        projects::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query project by ID")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<projects::Model>> {
        projects::Entity::find()
            .filter(projects::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query project by name")
    }

    /// Projects the user is a member of, filtered by the archive flag and
    /// ordered by membership insertion (membership id).
    pub async fn list_for_user(&self, user_id: i32, archived: bool) -> Result<Vec<projects::Model>> {
        let rows = project_users::Entity::find()
            .filter(project_users::Column::UserId.eq(user_id))
            .order_by_asc(project_users::Column::Id)
            .find_also_related(projects::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query projects for user")?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, project)| project)
            .filter(|p| p.is_archived == archived)
            .collect())
    }

    pub async fn update(&self, id: i32, name: &str, image_url: &str) -> Result<projects::Model> {
        let project = projects::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query project for update")?
            .ok_or_else(|| anyhow::anyhow!("Project not found: {id}"))?;

        let mut active: projects::ActiveModel = project.into();
        active.name = Set(name.to_string());
        active.image_url = Set(image_url.to_string());

        Ok(active.update(&self.conn).await?)
    }

    pub async fn set_archived(&self, id: i32) -> Result<()> {
        let project = projects::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query project for archiving")?
            .ok_or_else(|| anyhow::anyhow!("Project not found: {id}"))?;

        let mut active: projects::ActiveModel = project.into();
        active.is_archived = Set(true);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Cascade removal of the project, its memberships, notes and attachment
    /// rows. Foreign keys handle the children; this returns whether a row
    /// was actually deleted.
    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = projects::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete project")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn members(&self, project_id: i32) -> Result<Vec<Member>> {
        let rows = project_users::Entity::find()
            .filter(project_users::Column::ProjectId.eq(project_id))
            .order_by_asc(project_users::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query project members")?;

        Ok(rows
            .into_iter()
            .filter_map(|(membership, user)| {
                let user = user?;
                let permission = Permission::parse(&membership.permission)?;
                Some(Member {
                    membership_id: membership.id,
                    user_id: user.id,
                    username: user.username,
                    permission,
                })
            })
            .collect())
    }
}
