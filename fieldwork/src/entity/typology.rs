use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "typology")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub owner_id: Option<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::typology_entry::Entity")]
    TypologyEntry,
    #[sea_orm(has_many = "super::dataset_field::Entity")]
    DatasetField,
}

impl Related<super::typology_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TypologyEntry.def()
    }
}

impl Related<super::dataset_field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DatasetField.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
