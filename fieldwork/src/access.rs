//! Dataset access control and the mapping-area geographic filter.
//!
//! Everything here is a boolean predicate or a filter: denial never
//! raises, the API boundary decides the response. The acting user is
//! always passed in explicitly.

use geo::{Contains, Point, Polygon};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::areas;
use crate::entity::{
    app_user, dataset, dataset_group_mapping_area, dataset_shared_group, dataset_shared_user,
    dataset_user_mapping_area, geometry, group_member, mapping_area,
};

/// Read predicate: public, owned, directly shared, or shared via a group
/// the user belongs to. Superusers are handled at call sites (they see
/// every dataset in listings regardless of sharing).
pub async fn can_access(
    db: &impl ConnectionTrait,
    dataset: &dataset::Model,
    user: &app_user::Model,
) -> Result<bool, sea_orm::DbErr> {
    if dataset.is_public || dataset.owner_id == user.id {
        return Ok(true);
    }

    let shared = dataset_shared_user::Entity::find()
        .filter(dataset_shared_user::Column::DatasetId.eq(dataset.id))
        .filter(dataset_shared_user::Column::UserId.eq(user.id))
        .one(db)
        .await?;
    if shared.is_some() {
        return Ok(true);
    }

    let group_ids = user_group_ids(db, user.id).await?;
    if group_ids.is_empty() {
        return Ok(false);
    }
    let via_group = dataset_shared_group::Entity::find()
        .filter(dataset_shared_group::Column::DatasetId.eq(dataset.id))
        .filter(dataset_shared_group::Column::GroupId.is_in(group_ids))
        .one(db)
        .await?;
    Ok(via_group.is_some())
}

/// Mutation predicate for fields, mapping areas and dataset settings.
pub fn can_modify(dataset: &dataset::Model, user: &app_user::Model) -> bool {
    dataset.owner_id == user.id || user.is_superuser
}

async fn user_group_ids(
    db: &impl ConnectionTrait,
    user_id: Uuid,
) -> Result<Vec<Uuid>, sea_orm::DbErr> {
    Ok(group_member::Entity::find()
        .filter(group_member::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|m| m.group_id)
        .collect())
}

/// The mapping areas a user is limited to within a dataset: the union of
/// direct user bindings and bindings of any group the user belongs to.
/// Empty means unrestricted.
pub async fn allowed_areas(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
    user: &app_user::Model,
) -> Result<Vec<mapping_area::Model>, sea_orm::DbErr> {
    let mut area_ids: Vec<Uuid> = dataset_user_mapping_area::Entity::find()
        .filter(dataset_user_mapping_area::Column::DatasetId.eq(dataset_id))
        .filter(dataset_user_mapping_area::Column::UserId.eq(user.id))
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.mapping_area_id)
        .collect();

    let group_ids = user_group_ids(db, user.id).await?;
    if !group_ids.is_empty() {
        let via_groups = dataset_group_mapping_area::Entity::find()
            .filter(dataset_group_mapping_area::Column::DatasetId.eq(dataset_id))
            .filter(dataset_group_mapping_area::Column::GroupId.is_in(group_ids))
            .all(db)
            .await?;
        area_ids.extend(via_groups.into_iter().map(|l| l.mapping_area_id));
    }

    if area_ids.is_empty() {
        return Ok(Vec::new());
    }
    area_ids.sort();
    area_ids.dedup();

    mapping_area::Entity::find()
        .filter(mapping_area::Column::Id.is_in(area_ids))
        .all(db)
        .await
}

/// Decode the polygons of the given areas, skipping corrupt rows.
fn area_polygons(areas_list: &[mapping_area::Model]) -> Vec<Polygon<f64>> {
    areas_list
        .iter()
        .filter_map(|area| match areas::ring_from_json(&area.ring) {
            Ok(ring) => Some(areas::ring_to_polygon(&ring)),
            Err(e) => {
                tracing::warn!(area = %area.id, error = %e, "skipping unreadable mapping area");
                None
            }
        })
        .collect()
}

fn point_in_any(polygons: &[Polygon<f64>], lon: f64, lat: f64) -> bool {
    let point = Point::new(lon, lat);
    polygons.iter().any(|poly| poly.contains(&point))
}

/// Per-geometry access: owner and superuser bypass; otherwise the user
/// must have no area bindings for the dataset (unrestricted) or the
/// point must fall inside one of their allowed polygons.
pub async fn user_has_geometry_access(
    db: &impl ConnectionTrait,
    dataset: &dataset::Model,
    geom: &geometry::Model,
    user: &app_user::Model,
) -> Result<bool, sea_orm::DbErr> {
    if user.is_superuser || dataset.owner_id == user.id {
        return Ok(true);
    }

    let allowed = allowed_areas(db, dataset.id, user).await?;
    if allowed.is_empty() {
        return Ok(true);
    }
    Ok(point_in_any(&area_polygons(&allowed), geom.lon, geom.lat))
}

/// Bulk variant of the area filter for listing and map-data endpoints:
/// one binding lookup, then an in-memory containment test per geometry.
pub async fn filter_geometries_for_user(
    db: &impl ConnectionTrait,
    dataset: &dataset::Model,
    user: &app_user::Model,
    geometries: Vec<geometry::Model>,
) -> Result<Vec<geometry::Model>, sea_orm::DbErr> {
    if user.is_superuser || dataset.owner_id == user.id {
        return Ok(geometries);
    }

    let allowed = allowed_areas(db, dataset.id, user).await?;
    if allowed.is_empty() {
        return Ok(geometries);
    }

    let polygons = area_polygons(&allowed);
    Ok(geometries
        .into_iter()
        .filter(|g| point_in_any(&polygons, g.lon, g.lat))
        .collect())
}
