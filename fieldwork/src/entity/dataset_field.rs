use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// A dynamically defined column for a dataset's entries. The schema is
/// runtime data: rows appear through the field editor or as a byproduct
/// of CSV import.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "dataset_field")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dataset_id: Uuid,
    /// Internal key, unique per dataset.
    pub field_name: String,
    pub label: String,
    /// One of the FieldType wire names ("text", "integer", ...).
    pub field_type: String,
    pub required: bool,
    pub enabled: bool,
    pub non_editable: bool,
    pub help_text: Option<String>,
    /// Comma-separated manual choice list; ignored when a typology is bound.
    pub choices: Option<String>,
    pub order_index: i32,
    pub is_coordinate_field: bool,
    pub is_id_field: bool,
    pub is_address_field: bool,
    pub typology_id: Option<Uuid>,
    /// Restricts typology-derived choices to one category.
    pub typology_category: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
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
        belongs_to = "super::typology::Entity",
        from = "Column::TypologyId",
        to = "super::typology::Column::Id",
        on_delete = "SetNull"
    )]
    Typology,
}

impl Related<super::dataset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dataset.def()
    }
}

impl Related<super::typology::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Typology.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
