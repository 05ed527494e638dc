use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// One timestamped record of attribute values attached to a geometry.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub geometry_id: Uuid,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::geometry::Entity",
        from = "Column::GeometryId",
        to = "super::geometry::Column::Id",
        on_delete = "Cascade"
    )]
    Geometry,
    #[sea_orm(has_many = "super::entry_field_value::Entity")]
    EntryFieldValue,
    #[sea_orm(has_many = "super::entry_file::Entity")]
    EntryFile,
}

impl Related<super::geometry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Geometry.def()
    }
}

impl Related<super::entry_field_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFieldValue.def()
    }
}

impl Related<super::entry_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
