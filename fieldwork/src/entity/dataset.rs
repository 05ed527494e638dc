use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "dataset")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub is_public: bool,
    pub allow_multiple_entries: bool,
    pub enable_mapping_areas: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::app_user::Entity",
        from = "Column::OwnerId",
        to = "super::app_user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::dataset_field::Entity")]
    DatasetField,
    #[sea_orm(has_many = "super::geometry::Entity")]
    Geometry,
    #[sea_orm(has_many = "super::mapping_area::Entity")]
    MappingArea,
    #[sea_orm(has_many = "super::dataset_shared_user::Entity")]
    SharedUser,
    #[sea_orm(has_many = "super::dataset_shared_group::Entity")]
    SharedGroup,
    #[sea_orm(has_many = "super::export_task::Entity")]
    ExportTask,
}

impl Related<super::app_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::dataset_field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DatasetField.def()
    }
}

impl Related<super::geometry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Geometry.def()
    }
}

impl Related<super::mapping_area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MappingArea.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
