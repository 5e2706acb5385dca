use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub note_id: i32,

    /// Storage path relative to the upload dir ("attachments/<uuid>/<name>").
    pub file_path: String,

    pub created_at: String,
}

impl Model {
    /// Original filename for display, without the storage-path prefix.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.file_path
            .rsplit_once('/')
            .map_or(self.file_path.as_str(), |(_, name)| name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::notes::Entity",
        from = "Column::NoteId",
        to = "super::notes::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Notes,
}

impl Related<super::notes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    #[test]
    fn display_name_strips_storage_prefix() {
        let model = super::Model {
            id: 1,
            note_id: 1,
            file_path: "attachments/3f2a/watering-schedule.pdf".to_string(),
            created_at: String::new(),
        };
        assert_eq!(model.display_name(), "watering-schedule.pdf");
    }

    #[test]
    fn display_name_passes_bare_names_through() {
        let model = super::Model {
            id: 1,
            note_id: 1,
            file_path: "plain.txt".to_string(),
            created_at: String::new(),
        };
        assert_eq!(model.display_name(), "plain.txt");
    }
}
