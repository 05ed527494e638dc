use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::areas::{self, AreaError};
use crate::entity::{
    dataset_group_mapping_area, dataset_user_mapping_area, mapping_area,
};

use super::dataset_handlers::{load_dataset, require_modify};
use super::{
    AppState, ApiErr, load_user,
    dto::{AreaResponse, CreateAreaRequest, SetAllocationsRequest, UpdateAreaRequest},
    jwt::AuthClaims,
};

fn coords_to_pairs(coords: &[[f64; 2]]) -> Vec<(f64, f64)> {
    coords.iter().map(|c| (c[0], c[1])).collect()
}

async fn area_response(state: &AppState, area: mapping_area::Model) -> Result<AreaResponse, ApiErr> {
    let ring = areas::ring_from_json(&area.ring).map_err(ApiErr::internal)?;
    let allocated = areas::allocated_users(&state.db, area.id)
        .await
        .map_err(ApiErr::internal)?;
    Ok(AreaResponse {
        id: area.id,
        name: area.name,
        point_count: ring.len(),
        ring,
        allocated_users: allocated,
        created_by: area.created_by,
        created_at: area.created_at,
    })
}

async fn load_area(
    state: &AppState,
    dataset_id: Uuid,
    area_id: Uuid,
) -> Result<mapping_area::Model, ApiErr> {
    mapping_area::Entity::find_by_id(area_id)
        .filter(mapping_area::Column::DatasetId.eq(dataset_id))
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Mapping area not found"))
}

fn area_error_to_api(e: AreaError) -> ApiErr {
    match e {
        AreaError::InvalidPolygon(_) => ApiErr::bad_request(e.to_string()),
        AreaError::NotFound => ApiErr::not_found(e.to_string()),
        AreaError::Db(e) => ApiErr::internal(e),
    }
}

pub async fn list_areas(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AreaResponse>>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    // Area management is owner territory, same as mutations.
    require_modify(&ds, &user)?;

    let list = mapping_area::Entity::find()
        .filter(mapping_area::Column::DatasetId.eq(ds.id))
        .all(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    let mut out = Vec::with_capacity(list.len());
    for area in list {
        // Skip rows with unreadable geometry instead of failing the list.
        match area_response(&state, area).await {
            Ok(resp) => out.push(resp),
            Err(_) => continue,
        }
    }
    Ok(Json(out))
}

pub async fn create_area(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateAreaRequest>,
) -> Result<(StatusCode, Json<AreaResponse>), ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiErr::bad_request("Name is required"));
    }

    let pairs = coords_to_pairs(&body.coordinates);
    let area = areas::create_area(&state.db, ds.id, name, &pairs, Some(user.id))
        .await
        .map_err(area_error_to_api)?;

    if !body.allocated_users.is_empty() {
        areas::set_allocated_users(&state.db, area.id, &body.allocated_users)
            .await
            .map_err(ApiErr::internal)?;
    }

    tracing::info!(dataset = %ds.id, area = %area.id, "mapping area created");
    let resp = area_response(&state, area).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

pub async fn update_area(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path((id, area_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateAreaRequest>,
) -> Result<Json<AreaResponse>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    let area = load_area(&state, ds.id, area_id).await?;
    let pairs = body.coordinates.as_deref().map(coords_to_pairs);
    let updated = areas::update_area(&state.db, area, body.name.as_deref(), pairs.as_deref())
        .await
        .map_err(area_error_to_api)?;

    if let Some(allocated) = body.allocated_users {
        areas::set_allocated_users(&state.db, updated.id, &allocated)
            .await
            .map_err(ApiErr::internal)?;
    }

    let resp = area_response(&state, updated).await?;
    Ok(Json(resp))
}

pub async fn delete_area(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path((id, area_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    let area = load_area(&state, ds.id, area_id).await?;
    mapping_area::Entity::delete_by_id(area.id)
        .exec(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Replace which users and groups are limited to this area. A user or
/// group bound here may only touch geometries inside the area's polygon
/// (union over all their bound areas).
pub async fn set_allocations(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path((id, area_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<SetAllocationsRequest>,
) -> Result<StatusCode, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    let area = load_area(&state, ds.id, area_id).await?;

    dataset_user_mapping_area::Entity::delete_many()
        .filter(dataset_user_mapping_area::Column::DatasetId.eq(ds.id))
        .filter(dataset_user_mapping_area::Column::MappingAreaId.eq(area.id))
        .exec(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    for user_id in &body.user_ids {
        dataset_user_mapping_area::ActiveModel {
            id: Set(Uuid::now_v7()),
            dataset_id: Set(ds.id),
            user_id: Set(*user_id),
            mapping_area_id: Set(area.id),
        }
        .insert(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    }

    dataset_group_mapping_area::Entity::delete_many()
        .filter(dataset_group_mapping_area::Column::DatasetId.eq(ds.id))
        .filter(dataset_group_mapping_area::Column::MappingAreaId.eq(area.id))
        .exec(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    for group_id in &body.group_ids {
        dataset_group_mapping_area::ActiveModel {
            id: Set(Uuid::now_v7()),
            dataset_id: Set(ds.id),
            group_id: Set(*group_id),
            mapping_area_id: Set(area.id),
        }
        .insert(&state.db)
        .await
        .map_err(ApiErr::internal)?;
    }

    areas::set_allocated_users(&state.db, area.id, &body.user_ids)
        .await
        .map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}
