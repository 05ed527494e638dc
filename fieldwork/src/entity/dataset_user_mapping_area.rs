use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// Binds a user to one allowed mapping area within a dataset. Presence of
/// any binding restricts the user to the union of their bound polygons.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "dataset_user_mapping_area")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub user_id: Uuid,
    pub mapping_area_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dataset::Entity",
        from = "Column::DatasetId",
        to = "super::dataset::Column::Id",
        on_delete = "Cascade"
    )]
    Dataset,
    #[sea_orm(
        belongs_to = "super::app_user::Entity",
        from = "Column::UserId",
        to = "super::app_user::Column::Id",
        on_delete = "Cascade"
    )]
    AppUser,
    #[sea_orm(
        belongs_to = "super::mapping_area::Entity",
        from = "Column::MappingAreaId",
        to = "super::mapping_area::Column::Id",
        on_delete = "Cascade"
    )]
    MappingArea,
}

impl Related<super::mapping_area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MappingArea.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
