use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::access;
use crate::codec::FieldType;
use crate::data::{self, DataError};
use crate::entity::{dataset_field, entry, geometry};

use super::dataset_handlers::{load_dataset, require_access};
use super::{
    AppState, ApiErr, load_user,
    dto::{
        CreateEntryRequest, CreateGeometryRequest, EntryResponse, EntryValuesResponse,
        GeometryResponse, SetEntryValuesRequest,
    },
    jwt::AuthClaims,
};

pub async fn list_geometries(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GeometryResponse>>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let all = data::list_geometries(&state.db, ds.id)
        .await
        .map_err(ApiErr::internal)?;
    let visible = access::filter_geometries_for_user(&state.db, &ds, &user, all)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(visible.into_iter().map(Into::into).collect()))
}

pub async fn create_geometry(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateGeometryRequest>,
) -> Result<(StatusCode, Json<GeometryResponse>), ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let id_kurz = body.id_kurz.trim();
    if id_kurz.is_empty() {
        return Err(ApiErr::bad_request("id_kurz is required"));
    }
    let address = body
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown Address ({id_kurz})"));

    let geom = data::create_geometry(
        &state.db,
        ds.id,
        id_kurz,
        &address,
        body.lon,
        body.lat,
        Some(user.id),
    )
    .await
    .map_err(|e| match e {
        DataError::DuplicateIdKurz(_) => ApiErr::conflict(e.to_string()),
        DataError::Db(e) => ApiErr::internal(e),
        other => ApiErr::conflict(other.to_string()),
    })?;

    // Area-restricted users may only place points inside their own
    // polygons; roll the insert back when the new point lands outside.
    let allowed = access::user_has_geometry_access(&state.db, &ds, &geom, &user)
        .await
        .map_err(ApiErr::internal)?;
    if !allowed {
        geometry::Entity::delete_by_id(geom.id)
            .exec(&state.db)
            .await
            .map_err(ApiErr::internal)?;
        return Err(ApiErr::forbidden(
            "Point lies outside your allowed mapping areas",
        ));
    }

    Ok((StatusCode::CREATED, Json(GeometryResponse::from(geom))))
}

async fn load_geometry_with_dataset(
    state: &AppState,
    geometry_id: Uuid,
) -> Result<(geometry::Model, crate::entity::dataset::Model), ApiErr> {
    let geom = geometry::Entity::find_by_id(geometry_id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Geometry not found"))?;
    let ds = load_dataset(state, geom.dataset_id).await?;
    Ok((geom, ds))
}

pub async fn get_geometry(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GeometryResponse>, ApiErr> {
    let (geom, ds) = load_geometry_with_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let allowed = access::user_has_geometry_access(&state.db, &ds, &geom, &user)
        .await
        .map_err(ApiErr::internal)?;
    if !allowed {
        return Err(ApiErr::forbidden("Access denied"));
    }
    Ok(Json(GeometryResponse::from(geom)))
}

pub async fn create_entry(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiErr> {
    let (geom, ds) = load_geometry_with_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let allowed = access::user_has_geometry_access(&state.db, &ds, &geom, &user)
        .await
        .map_err(ApiErr::internal)?;
    if !allowed {
        return Err(ApiErr::forbidden("Access denied"));
    }

    let entry = data::create_entry(
        &state.db,
        geom.id,
        body.name,
        body.year,
        Some(user.id),
        ds.allow_multiple_entries,
    )
    .await
    .map_err(|e| match e {
        DataError::SingleEntryOnly => ApiErr::conflict(e.to_string()),
        DataError::Db(e) => ApiErr::internal(e),
        other => ApiErr::conflict(other.to_string()),
    })?;

    Ok((StatusCode::CREATED, Json(EntryResponse::from(entry))))
}

async fn load_entry_context(
    state: &AppState,
    entry_id: Uuid,
) -> Result<(entry::Model, geometry::Model, crate::entity::dataset::Model), ApiErr> {
    let e = entry::Entity::find_by_id(entry_id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Entry not found"))?;
    let (geom, ds) = load_geometry_with_dataset(state, e.geometry_id).await?;
    Ok((e, geom, ds))
}

pub async fn get_entry_values(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryValuesResponse>, ApiErr> {
    let (e, geom, ds) = load_entry_context(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let allowed = access::user_has_geometry_access(&state.db, &ds, &geom, &user)
        .await
        .map_err(ApiErr::internal)?;
    if !allowed {
        return Err(ApiErr::forbidden("Access denied"));
    }

    let values = data::decoded_values(&state.db, e.id)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(EntryValuesResponse { values }))
}

/// Upsert a batch of field values on one entry. The field_type copy on
/// each value row comes from the current schema when the field is known,
/// text otherwise.
pub async fn set_entry_values(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetEntryValuesRequest>,
) -> Result<Json<EntryValuesResponse>, ApiErr> {
    let (e, geom, ds) = load_entry_context(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let allowed = access::user_has_geometry_access(&state.db, &ds, &geom, &user)
        .await
        .map_err(ApiErr::internal)?;
    if !allowed {
        return Err(ApiErr::forbidden("Access denied"));
    }

    for (field_name, value) in &body.values {
        let field_type = dataset_field::Entity::find()
            .filter(dataset_field::Column::DatasetId.eq(ds.id))
            .filter(dataset_field::Column::FieldName.eq(field_name.clone()))
            .one(&state.db)
            .await
            .map_err(ApiErr::internal)?
            .map(|f| FieldType::parse(&f.field_type))
            .unwrap_or(FieldType::Text);

        data::set_field_value(&state.db, e.id, field_name, field_type, value.as_deref())
            .await
            .map_err(ApiErr::internal)?;
    }

    let values = data::decoded_values(&state.db, e.id)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(EntryValuesResponse { values }))
}
