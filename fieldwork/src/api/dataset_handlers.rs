use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::access;
use crate::data;
use crate::entity::{
    app_user, dataset, dataset_shared_group, dataset_shared_user, group_member,
};

use super::{
    AppState, ApiErr, load_user,
    dto::{
        CreateDatasetRequest, DatasetResponse, ListDatasetsQuery, MapDataResponse,
        PaginatedResponse, UpdateDatasetRequest,
    },
    jwt::AuthClaims,
};

/// Shared lookup used by every dataset-scoped handler module.
pub(crate) async fn load_dataset(state: &AppState, id: Uuid) -> Result<dataset::Model, ApiErr> {
    dataset::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Dataset not found"))
}

/// Read gate shared by dataset-scoped handlers.
pub(crate) async fn require_access(
    state: &AppState,
    dataset: &dataset::Model,
    user: &app_user::Model,
) -> Result<(), ApiErr> {
    if user.is_superuser {
        return Ok(());
    }
    let ok = access::can_access(&state.db, dataset, user)
        .await
        .map_err(ApiErr::internal)?;
    if ok {
        Ok(())
    } else {
        Err(ApiErr::forbidden("Access denied"))
    }
}

pub(crate) fn require_modify(
    dataset: &dataset::Model,
    user: &app_user::Model,
) -> Result<(), ApiErr> {
    if access::can_modify(dataset, user) {
        Ok(())
    } else {
        Err(ApiErr::forbidden("Only the dataset owner can do this"))
    }
}

pub async fn list_datasets(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Query(params): Query<ListDatasetsQuery>,
) -> Result<Json<PaginatedResponse<DatasetResponse>>, ApiErr> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).min(100);
    let user = load_user(&state, claims.sub).await?;

    let mut query = dataset::Entity::find();

    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        query = query.filter(dataset::Column::Name.contains(search.as_str()));
    }

    // Superusers see everything; everyone else sees public, owned and
    // shared datasets.
    if !user.is_superuser {
        let shared_ids: Vec<Uuid> = dataset_shared_user::Entity::find()
            .filter(dataset_shared_user::Column::UserId.eq(user.id))
            .all(&state.db)
            .await
            .map_err(ApiErr::internal)?
            .into_iter()
            .map(|s| s.dataset_id)
            .collect();

        let group_ids: Vec<Uuid> = group_member::Entity::find()
            .filter(group_member::Column::UserId.eq(user.id))
            .all(&state.db)
            .await
            .map_err(ApiErr::internal)?
            .into_iter()
            .map(|m| m.group_id)
            .collect();

        let group_shared_ids: Vec<Uuid> = if group_ids.is_empty() {
            Vec::new()
        } else {
            dataset_shared_group::Entity::find()
                .filter(dataset_shared_group::Column::GroupId.is_in(group_ids))
                .all(&state.db)
                .await
                .map_err(ApiErr::internal)?
                .into_iter()
                .map(|s| s.dataset_id)
                .collect()
        };

        let mut visible = Condition::any()
            .add(dataset::Column::IsPublic.eq(true))
            .add(dataset::Column::OwnerId.eq(user.id));
        if !shared_ids.is_empty() {
            visible = visible.add(dataset::Column::Id.is_in(shared_ids));
        }
        if !group_shared_ids.is_empty() {
            visible = visible.add(dataset::Column::Id.is_in(group_shared_ids));
        }
        query = query.filter(visible);
    }

    let paginator = query
        .order_by_desc(dataset::Column::CreatedAt)
        .paginate(&state.db, page_size);

    let total = paginator.num_items().await.map_err(ApiErr::internal)?;
    let datasets = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(PaginatedResponse {
        data: datasets.into_iter().map(DatasetResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

pub async fn create_dataset(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<CreateDatasetRequest>,
) -> Result<(StatusCode, Json<DatasetResponse>), ApiErr> {
    if body.name.trim().is_empty() {
        return Err(ApiErr::bad_request("Name is required"));
    }

    let now = Utc::now().naive_utc();
    let model = dataset::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        owner_id: Set(claims.sub),
        is_public: Set(body.is_public),
        allow_multiple_entries: Set(body.allow_multiple_entries),
        enable_mapping_areas: Set(body.enable_mapping_areas),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await
    .map_err(ApiErr::internal)?;

    Ok((StatusCode::CREATED, Json(DatasetResponse::from(model))))
}

pub async fn get_dataset(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DatasetResponse>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;
    Ok(Json(DatasetResponse::from(ds)))
}

pub async fn update_dataset(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateDatasetRequest>,
) -> Result<Json<DatasetResponse>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    if let Some(user_ids) = body.shared_user_ids {
        dataset_shared_user::Entity::delete_many()
            .filter(dataset_shared_user::Column::DatasetId.eq(ds.id))
            .exec(&state.db)
            .await
            .map_err(ApiErr::internal)?;
        for user_id in user_ids {
            dataset_shared_user::ActiveModel {
                id: Set(Uuid::now_v7()),
                dataset_id: Set(ds.id),
                user_id: Set(user_id),
            }
            .insert(&state.db)
            .await
            .map_err(ApiErr::internal)?;
        }
    }

    if let Some(group_ids) = body.shared_group_ids {
        dataset_shared_group::Entity::delete_many()
            .filter(dataset_shared_group::Column::DatasetId.eq(ds.id))
            .exec(&state.db)
            .await
            .map_err(ApiErr::internal)?;
        for group_id in group_ids {
            dataset_shared_group::ActiveModel {
                id: Set(Uuid::now_v7()),
                dataset_id: Set(ds.id),
                group_id: Set(group_id),
            }
            .insert(&state.db)
            .await
            .map_err(ApiErr::internal)?;
        }
    }

    let mut active: dataset::ActiveModel = ds.into();
    if let Some(name) = body.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = body.description {
        active.description = Set(Some(description));
    }
    if let Some(is_public) = body.is_public {
        active.is_public = Set(is_public);
    }
    if let Some(allow_multiple_entries) = body.allow_multiple_entries {
        active.allow_multiple_entries = Set(allow_multiple_entries);
    }
    if let Some(enable_mapping_areas) = body.enable_mapping_areas {
        active.enable_mapping_areas = Set(enable_mapping_areas);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;
    Ok(Json(DatasetResponse::from(updated)))
}

pub async fn delete_dataset(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_modify(&ds, &user)?;

    dataset::Entity::delete_by_id(ds.id)
        .exec(&state.db)
        .await
        .map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Geometries visible to the acting user: dataset access plus the
/// mapping-area restriction.
pub async fn map_data(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MapDataResponse>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let all = data::list_geometries(&state.db, ds.id)
        .await
        .map_err(ApiErr::internal)?;
    let visible = access::filter_geometries_for_user(&state.db, &ds, &user, all)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(MapDataResponse {
        map_data: visible.into_iter().map(Into::into).collect(),
    }))
}
