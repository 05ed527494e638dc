use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "typology_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub typology_id: Uuid,
    /// Unique per typology.
    pub code: i32,
    pub category: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::typology::Entity",
        from = "Column::TypologyId",
        to = "super::typology::Column::Id",
        on_delete = "Cascade"
    )]
    Typology,
}

impl Related<super::typology::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Typology.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
