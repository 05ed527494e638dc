use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::entity::typology;
use crate::typology::{self as typology_service, TypologyError};

use super::{
    AppState, ApiErr, load_user,
    dto::{
        AddTypologyEntryRequest, CreateTypologyRequest, ImportTypologyEntriesRequest,
        TypologyEntryResponse, TypologyImportResponse, TypologyResponse,
    },
    jwt::AuthClaims,
};

async fn load_typology(state: &AppState, id: Uuid) -> Result<typology::Model, ApiErr> {
    typology::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Typology not found"))
}

/// Owner-or-superuser gate for typology mutations.
fn require_owner(
    typology: &typology::Model,
    user: &crate::entity::app_user::Model,
) -> Result<(), ApiErr> {
    if user.is_superuser || typology.owner_id == Some(user.id) {
        Ok(())
    } else {
        Err(ApiErr::forbidden("Only the typology owner can do this"))
    }
}

pub async fn list_typologies(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
) -> Result<Json<Vec<TypologyResponse>>, ApiErr> {
    let user = load_user(&state, claims.sub).await?;
    let typologies = if user.is_superuser {
        typology::Entity::find()
            .all(&state.db)
            .await
            .map_err(ApiErr::internal)?
    } else {
        typology_service::list_visible(&state.db, user.id)
            .await
            .map_err(ApiErr::internal)?
    };
    Ok(Json(typologies.into_iter().map(Into::into).collect()))
}

pub async fn create_typology(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<CreateTypologyRequest>,
) -> Result<(StatusCode, Json<TypologyResponse>), ApiErr> {
    if body.name.trim().is_empty() {
        return Err(ApiErr::bad_request("Name is required"));
    }
    let model = typology_service::create_typology(
        &state.db,
        body.name.trim(),
        Some(claims.sub),
        body.is_public,
    )
    .await
    .map_err(ApiErr::internal)?;
    Ok((StatusCode::CREATED, Json(TypologyResponse::from(model))))
}

pub async fn get_typology(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TypologyResponse>, ApiErr> {
    let t = load_typology(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    if !t.is_public && t.owner_id != Some(user.id) && !user.is_superuser {
        return Err(ApiErr::forbidden("Access denied"));
    }
    Ok(Json(TypologyResponse::from(t)))
}

pub async fn delete_typology(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let t = load_typology(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_owner(&t, &user)?;

    typology_service::delete_typology(&state.db, t.id, true)
        .await
        .map_err(|e| match e {
            TypologyError::NotFound => ApiErr::not_found(e.to_string()),
            TypologyError::Db(e) => ApiErr::internal(e),
            other => ApiErr::conflict(other.to_string()),
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_entries(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TypologyEntryResponse>>, ApiErr> {
    let t = load_typology(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    if !t.is_public && t.owner_id != Some(user.id) && !user.is_superuser {
        return Err(ApiErr::forbidden("Access denied"));
    }

    let entries = typology_service::list_entries(&state.db, t.id)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub async fn add_entry(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddTypologyEntryRequest>,
) -> Result<(StatusCode, Json<TypologyEntryResponse>), ApiErr> {
    let t = load_typology(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_owner(&t, &user)?;

    let entry = typology_service::add_entry(&state.db, t.id, body.code, &body.category, &body.name)
        .await
        .map_err(|e| match e {
            TypologyError::DuplicateCode(_) => ApiErr::conflict(e.to_string()),
            TypologyError::Db(e) => ApiErr::internal(e),
            other => ApiErr::conflict(other.to_string()),
        })?;
    Ok((StatusCode::CREATED, Json(TypologyEntryResponse::from(entry))))
}

pub async fn import_entries(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ImportTypologyEntriesRequest>,
) -> Result<Json<TypologyImportResponse>, ApiErr> {
    let t = load_typology(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_owner(&t, &user)?;

    let report = typology_service::import_entries_csv(&state.db, t.id, &body.csv)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(TypologyImportResponse {
        imported: report.imported,
        errors: report.errors,
    }))
}
