use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::{attachments, notes};

pub struct NoteRepository {
    conn: DatabaseConnection,
}

impl NoteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a note and all of its attachment rows in one transaction so a
    /// failure partway through leaves no orphaned note behind.
    pub async fn create_with_attachments(
        &self,
        project_id: i32,
        user_id: i32,
        text: &str,
        file_paths: &[String],
    ) -> Result<notes::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let note = notes::ActiveModel {
            project_id: Set(project_id),
            user_id: Set(Some(user_id)),
            text: Set(text.to_string()),
            is_completed: Set(false),
            created_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if !file_paths.is_empty() {
            let rows: Vec<attachments::ActiveModel> = file_paths
                .iter()
                .map(|path| attachments::ActiveModel {
                    note_id: Set(note.id),
                    file_path: Set(path.clone()),
                    created_at: Set(now.clone()),
                    ..Default::default()
                })
                .collect();

            attachments::Entity::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;

        Ok(note)
    }

    pub async fn get(&self, id: i32) -> Result<Option<notes::Model>> {
        notes::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query note by ID")
    }

    /// Notes of a project in insertion order, each with its attachments.
    pub async fn list_for_project(
        &self,
        project_id: i32,
    ) -> Result<Vec<(notes::Model, Vec<attachments::Model>)>> {
        notes::Entity::find()
            .filter(notes::Column::ProjectId.eq(project_id))
            .order_by_asc(notes::Column::Id)
            .find_with_related(attachments::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query notes for project")
    }

    /// Flip `is_completed` and return the new value.
    pub async fn toggle_completed(&self, id: i32) -> Result<Option<bool>> {
        let Some(note) = notes::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query note for completion toggle")?
        else {
            return Ok(None);
        };

        let flipped = !note.is_completed;
        let mut active: notes::ActiveModel = note.into();
        active.is_completed = Set(flipped);
        active.update(&self.conn).await?;

        Ok(Some(flipped))
    }

    pub async fn attachments_of(&self, note_id: i32) -> Result<Vec<attachments::Model>> {
        attachments::Entity::find()
            .filter(attachments::Column::NoteId.eq(note_id))
            .all(&self.conn)
            .await
            .context("Failed to query attachments for note")
    }

    /// Storage paths of every attachment under the project, gathered before
    /// a cascade delete so the stored files can be cleaned up afterwards.
    pub async fn attachment_paths_for_project(&self, project_id: i32) -> Result<Vec<String>> {
        let rows = notes::Entity::find()
            .filter(notes::Column::ProjectId.eq(project_id))
            .find_with_related(attachments::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query attachment paths for project")?;

        Ok(rows
            .into_iter()
            .flat_map(|(_, files)| files)
            .map(|a| a.file_path)
            .collect())
    }

    /// Delete the note; attachment rows go with it via the foreign key.
    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = notes::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete note")?;

        Ok(result.rows_affected > 0)
    }
}
