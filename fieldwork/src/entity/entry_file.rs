use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "entry_file")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_id: Uuid,
    /// Storage path relative to the media root.
    pub file_path: String,
    pub filename: String,
    /// MIME type, e.g. "image/jpeg".
    pub file_type: String,
    pub file_size: i64,
    pub upload_user_id: Option<Uuid>,
    pub description: Option<String>,
    pub uploaded_at: DateTime,
}

impl Model {
    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::entry::Entity",
        from = "Column::EntryId",
        to = "super::entry::Column::Id",
        on_delete = "Cascade"
    )]
    Entry,
}

impl Related<super::entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
