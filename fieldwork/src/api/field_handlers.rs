use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::codec::FieldType;
use crate::entity::dataset_field;
use crate::schema::{self, NewField, SchemaError};

use super::dataset_handlers::{load_dataset, require_access, require_modify};
use super::{
    AppState, ApiErr, load_user,
    dto::{CreateFieldRequest, FieldResponse, RepairFieldsResponse, UpdateFieldRequest},
    jwt::AuthClaims,
};

pub async fn list_fields(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FieldResponse>>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let fields = schema::list_fields(&state.db, ds.id, false)
        .await
        .map_err(ApiErr::internal)?;

    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let choices = schema::effective_choices(&state.db, &field)
            .await
            .map_err(ApiErr::internal)?;
        out.push(FieldResponse::from_model(field, choices));
    }
    Ok(Json(out))
}

pub async fn create_field(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateFieldRequest>,
) -> Result<(StatusCode, Json<FieldResponse>), ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    if body.label.trim().is_empty() {
        return Err(ApiErr::bad_request("Label is required"));
    }
    let field_name = match body.field_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => schema::clean_field_name(&body.label),
    };
    if field_name.is_empty() {
        return Err(ApiErr::bad_request("Field name cannot be empty"));
    }

    let spec = NewField {
        field_name,
        label: body.label.trim().to_string(),
        field_type: FieldType::parse(&body.field_type),
        required: body.required,
        enabled: body.enabled,
        help_text: body.help_text,
        choices: body.choices,
        order_index: body.order_index,
        typology_id: body.typology_id,
        typology_category: body.typology_category,
    };

    let field = schema::create_field(&state.db, ds.id, spec)
        .await
        .map_err(|e| match e {
            SchemaError::DuplicateFieldName(_) => ApiErr::conflict(e.to_string()),
            SchemaError::Db(e) => ApiErr::internal(e),
        })?;

    let choices = schema::effective_choices(&state.db, &field)
        .await
        .map_err(ApiErr::internal)?;
    Ok((
        StatusCode::CREATED,
        Json(FieldResponse::from_model(field, choices)),
    ))
}

pub async fn update_field(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path((id, field_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateFieldRequest>,
) -> Result<Json<FieldResponse>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    let field = dataset_field::Entity::find_by_id(field_id)
        .filter(dataset_field::Column::DatasetId.eq(ds.id))
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Field not found"))?;

    if field.non_editable {
        return Err(ApiErr::conflict("Field is not editable"));
    }

    let mut active: dataset_field::ActiveModel = field.into();
    if let Some(label) = body.label {
        active.label = Set(label.trim().to_string());
    }
    if let Some(field_type) = body.field_type {
        active.field_type = Set(FieldType::parse(&field_type).as_str().to_string());
    }
    if let Some(required) = body.required {
        active.required = Set(required);
    }
    if let Some(enabled) = body.enabled {
        active.enabled = Set(enabled);
    }
    if let Some(help_text) = body.help_text {
        active.help_text = Set(Some(help_text));
    }
    if let Some(choices) = body.choices {
        active.choices = Set(Some(choices));
    }
    if let Some(order_index) = body.order_index {
        active.order_index = Set(order_index);
    }
    if let Some(typology_id) = body.typology_id {
        active.typology_id = Set(typology_id);
    }
    if let Some(typology_category) = body.typology_category {
        active.typology_category = Set(typology_category);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;
    let choices = schema::effective_choices(&state.db, &updated)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(FieldResponse::from_model(updated, choices)))
}

pub async fn delete_field(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path((id, field_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    let field = dataset_field::Entity::find_by_id(field_id)
        .filter(dataset_field::Column::DatasetId.eq(ds.id))
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Field not found"))?;

    if field.non_editable {
        return Err(ApiErr::conflict("Field is not editable"));
    }

    // Existing entry_field_value rows keep the orphaned field_name; the
    // attribute store has no FK to the schema.
    dataset_field::Entity::delete_by_id(field.id)
        .exec(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Explicit recovery: enable all fields when none are enabled.
pub async fn repair_fields(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RepairFieldsResponse>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    let enabled = schema::enable_all_fields_if_none_enabled(&state.db, ds.id)
        .await
        .map_err(ApiErr::internal)?;
    Ok(Json(RepairFieldsResponse { enabled }))
}
