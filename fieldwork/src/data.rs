//! Geometry, entry and entry-field-value operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::codec::{self, FieldType, TypedValue};
use crate::entity::{entry, entry_field_value, geometry};

#[derive(Debug)]
pub enum DataError {
    /// (dataset, id_kurz) already taken.
    DuplicateIdKurz(String),
    /// Dataset allows a single entry per geometry and one already exists.
    SingleEntryOnly,
    NotFound,
    Db(sea_orm::DbErr),
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::DuplicateIdKurz(id) => {
                write!(f, "ID \"{id}\" already exists in this dataset")
            }
            DataError::SingleEntryOnly => {
                write!(f, "This dataset allows only one entry per geometry")
            }
            DataError::NotFound => write!(f, "Record not found"),
            DataError::Db(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<sea_orm::DbErr> for DataError {
    fn from(e: sea_orm::DbErr) -> Self {
        DataError::Db(e)
    }
}

/// Create a geometry point. WGS84 lon/lat.
pub async fn create_geometry(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
    id_kurz: &str,
    address: &str,
    lon: f64,
    lat: f64,
    user_id: Option<Uuid>,
) -> Result<geometry::Model, DataError> {
    let now = chrono::Utc::now().naive_utc();
    geometry::ActiveModel {
        id: Set(Uuid::now_v7()),
        dataset_id: Set(dataset_id),
        id_kurz: Set(id_kurz.to_string()),
        address: Set(address.to_string()),
        lon: Set(lon),
        lat: Set(lat),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| {
        let msg = e.to_string();
        if msg.contains("UNIQUE") || msg.contains("unique") {
            DataError::DuplicateIdKurz(id_kurz.to_string())
        } else {
            DataError::Db(e)
        }
    })
}

/// Create an entry under a geometry. When the dataset restricts to a
/// single entry per geometry the caller passes `allow_multiple = false`
/// and a second entry is refused here — this is workflow enforcement,
/// not a DB constraint.
pub async fn create_entry(
    db: &impl ConnectionTrait,
    geometry_id: Uuid,
    name: Option<String>,
    year: Option<i32>,
    user_id: Option<Uuid>,
    allow_multiple: bool,
) -> Result<entry::Model, DataError> {
    if !allow_multiple {
        let existing = entry::Entity::find()
            .filter(entry::Column::GeometryId.eq(geometry_id))
            .count(db)
            .await?;
        if existing > 0 {
            return Err(DataError::SingleEntryOnly);
        }
    }

    let now = chrono::Utc::now().naive_utc();
    Ok(entry::ActiveModel {
        id: Set(Uuid::now_v7()),
        geometry_id: Set(geometry_id),
        name: Set(name),
        year: Set(year),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

/// Upsert a field value on an entry. Unlike geometry and schema creation
/// this is not a uniqueness failure: a second write for the same
/// (entry, field_name) updates the existing row, including its
/// field_type copy.
pub async fn set_field_value(
    db: &impl ConnectionTrait,
    entry_id: Uuid,
    field_name: &str,
    field_type: FieldType,
    value: Option<&str>,
) -> Result<entry_field_value::Model, sea_orm::DbErr> {
    let now = chrono::Utc::now().naive_utc();
    let existing = entry_field_value::Entity::find()
        .filter(entry_field_value::Column::EntryId.eq(entry_id))
        .filter(entry_field_value::Column::FieldName.eq(field_name))
        .one(db)
        .await?;

    if let Some(model) = existing {
        let mut active: entry_field_value::ActiveModel = model.into();
        active.value = Set(value.map(str::to_string));
        active.field_type = Set(field_type.as_str().to_string());
        active.updated_at = Set(now);
        active.update(db).await
    } else {
        entry_field_value::ActiveModel {
            id: Set(Uuid::now_v7()),
            entry_id: Set(entry_id),
            field_name: Set(field_name.to_string()),
            field_type: Set(field_type.as_str().to_string()),
            value: Set(value.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }
}

/// Raw value of one field on an entry, None when the row is absent.
pub async fn get_field_value(
    db: &impl ConnectionTrait,
    entry_id: Uuid,
    field_name: &str,
) -> Result<Option<String>, sea_orm::DbErr> {
    Ok(entry_field_value::Entity::find()
        .filter(entry_field_value::Column::EntryId.eq(entry_id))
        .filter(entry_field_value::Column::FieldName.eq(field_name))
        .one(db)
        .await?
        .and_then(|v| v.value))
}

/// All of an entry's values decoded by the field_type stored on each
/// value row (which may legitimately diverge from the current schema).
pub async fn decoded_values(
    db: &impl ConnectionTrait,
    entry_id: Uuid,
) -> Result<BTreeMap<String, TypedValue>, sea_orm::DbErr> {
    let rows = entry_field_value::Entity::find()
        .filter(entry_field_value::Column::EntryId.eq(entry_id))
        .order_by_asc(entry_field_value::Column::FieldName)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let decoded = codec::decode(row.value.as_deref(), FieldType::parse(&row.field_type));
            (row.field_name, decoded)
        })
        .collect())
}

/// Geometries of a dataset, newest first.
pub async fn list_geometries(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
) -> Result<Vec<geometry::Model>, sea_orm::DbErr> {
    geometry::Entity::find()
        .filter(geometry::Column::DatasetId.eq(dataset_id))
        .order_by_desc(geometry::Column::CreatedAt)
        .all(db)
        .await
}

/// Delete every geometry of a dataset (entries and values cascade).
/// Used by the import "clear existing data" pre-step.
pub async fn clear_dataset_geometries(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
) -> Result<u64, sea_orm::DbErr> {
    let result = geometry::Entity::delete_many()
        .filter(geometry::Column::DatasetId.eq(dataset_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
