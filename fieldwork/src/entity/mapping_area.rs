use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// A polygon restricting users or groups to a geographic sub-region of a
/// dataset. The exterior ring is stored as JSON `[[lon, lat], ...]`,
/// closed (last vertex equals the first).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "mapping_area")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub name: String,
    pub ring: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime,
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
    #[sea_orm(has_many = "super::mapping_area_user::Entity")]
    MappingAreaUser,
}

impl Related<super::dataset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dataset.def()
    }
}

impl Related<super::mapping_area_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MappingAreaUser.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
