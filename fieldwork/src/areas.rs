//! Mapping areas: polygons restricting users or groups to a geographic
//! sub-region of a dataset.

use geo::{Coord, LineString, Polygon};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::{mapping_area, mapping_area_user};

#[derive(Debug)]
pub enum AreaError {
    /// Fewer than 4 coordinate pairs after ring closing, or malformed
    /// coordinates.
    InvalidPolygon(String),
    NotFound,
    Db(sea_orm::DbErr),
}

impl std::fmt::Display for AreaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaError::InvalidPolygon(msg) => write!(f, "Invalid polygon: {msg}"),
            AreaError::NotFound => write!(f, "Mapping area not found"),
            AreaError::Db(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for AreaError {}

impl From<sea_orm::DbErr> for AreaError {
    fn from(e: sea_orm::DbErr) -> Self {
        AreaError::Db(e)
    }
}

/// Validate an exterior ring given as `[[lon, lat], ...]` pairs.
///
/// At least 4 pairs (3 distinct vertices plus the closing point) are
/// required; the ring is then auto-closed when the last vertex differs
/// from the first. Anything less is rejected rather than stored as a
/// degenerate polygon.
pub fn parse_ring(coords: &[(f64, f64)]) -> Result<Vec<(f64, f64)>, AreaError> {
    if coords.len() < 4 {
        return Err(AreaError::InvalidPolygon(
            "a polygon requires at least four points".to_string(),
        ));
    }
    if coords.iter().any(|(lon, lat)| !lon.is_finite() || !lat.is_finite()) {
        return Err(AreaError::InvalidPolygon("non-finite coordinate".to_string()));
    }

    let mut ring = coords.to_vec();
    if ring.first() != ring.last() {
        ring.push(ring[0]);
    }
    Ok(ring)
}

/// Decode a stored ring (JSON `[[lon, lat], ...]`). Stored rings were
/// validated on the way in, so failures here indicate corrupt rows and
/// come back as `InvalidPolygon`.
pub fn ring_from_json(json: &str) -> Result<Vec<(f64, f64)>, AreaError> {
    let pairs: Vec<(f64, f64)> = serde_json::from_str(json)
        .map_err(|e| AreaError::InvalidPolygon(format!("stored ring is unreadable: {e}")))?;
    parse_ring(&pairs)
}

/// Build the geo polygon used for containment tests.
pub fn ring_to_polygon(ring: &[(f64, f64)]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|&(x, y)| Coord { x, y }).collect();
    Polygon::new(LineString::from(coords), vec![])
}

/// Create a mapping area from raw coordinate pairs.
pub async fn create_area(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
    name: &str,
    coords: &[(f64, f64)],
    created_by: Option<Uuid>,
) -> Result<mapping_area::Model, AreaError> {
    let ring = parse_ring(coords)?;
    let ring_json = serde_json::to_string(&ring)
        .map_err(|e| AreaError::InvalidPolygon(e.to_string()))?;

    Ok(mapping_area::ActiveModel {
        id: Set(Uuid::now_v7()),
        dataset_id: Set(dataset_id),
        name: Set(name.to_string()),
        ring: Set(ring_json),
        created_by: Set(created_by),
        created_at: Set(chrono::Utc::now().naive_utc()),
    }
    .insert(db)
    .await?)
}

/// Update name and/or geometry of an area.
pub async fn update_area(
    db: &impl ConnectionTrait,
    area: mapping_area::Model,
    name: Option<&str>,
    coords: Option<&[(f64, f64)]>,
) -> Result<mapping_area::Model, AreaError> {
    let mut active: mapping_area::ActiveModel = area.into();
    if let Some(name) = name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(coords) = coords {
        let ring = parse_ring(coords)?;
        let ring_json = serde_json::to_string(&ring)
            .map_err(|e| AreaError::InvalidPolygon(e.to_string()))?;
        active.ring = Set(ring_json);
    }
    Ok(active.update(db).await?)
}

/// Replace the set of users allocated to an area.
pub async fn set_allocated_users(
    db: &impl ConnectionTrait,
    mapping_area_id: Uuid,
    user_ids: &[Uuid],
) -> Result<(), sea_orm::DbErr> {
    mapping_area_user::Entity::delete_many()
        .filter(mapping_area_user::Column::MappingAreaId.eq(mapping_area_id))
        .exec(db)
        .await?;
    for &user_id in user_ids {
        mapping_area_user::ActiveModel {
            id: Set(Uuid::now_v7()),
            mapping_area_id: Set(mapping_area_id),
            user_id: Set(user_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

pub async fn allocated_users(
    db: &impl ConnectionTrait,
    mapping_area_id: Uuid,
) -> Result<Vec<Uuid>, sea_orm::DbErr> {
    Ok(mapping_area_user::Entity::find()
        .filter(mapping_area_user::Column::MappingAreaId.eq(mapping_area_id))
        .all(db)
        .await?
        .into_iter()
        .map(|m| m.user_id)
        .collect())
}
