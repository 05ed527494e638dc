use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::export::csv::export_dataset_csv;
use crate::export::zip_job::{self, ExportParams, OrganizeBy};
use crate::entity::export_task;

use super::dataset_handlers::{load_dataset, require_access};
use super::{
    AppState, ApiErr, load_user,
    dto::{CreateFileExportRequest, ExportTaskResponse},
    jwt::AuthClaims,
};

/// Flattened dataset download: one CSV row per (geometry, entry) pair.
pub async fn export_csv(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let csv_text = export_dataset_csv(&state.db, &ds)
        .await
        .map_err(ApiErr::internal)?;

    let filename = format!("{}_export.csv", ds.name.replace(['/', '\\'], "_"));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv_text,
    )
        .into_response())
}

/// Create a file-bundle export task and dispatch the worker. Returns
/// immediately; poll `/export-tasks/{id}` for progress.
pub async fn create_file_export(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateFileExportRequest>,
) -> Result<(StatusCode, Json<ExportTaskResponse>), ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let organize_by = OrganizeBy::parse(&body.organize_by)
        .ok_or_else(|| ApiErr::bad_request("Unknown organize_by strategy"))?;
    if let (Some(from), Some(to)) = (body.date_from, body.date_to)
        && from > to
    {
        return Err(ApiErr::bad_request("date_from is after date_to"));
    }

    let params = ExportParams {
        file_types: body.file_types,
        date_from: body.date_from,
        date_to: body.date_to,
        organize_by,
        include_metadata: body.include_metadata,
    };

    let task = zip_job::create_task(&state.db, ds.id, user.id, &params)
        .await
        .map_err(ApiErr::internal)?;

    zip_job::spawn(
        state.db.clone(),
        task.clone(),
        state.media_root.clone(),
        state.notifier.clone(),
    );

    Ok((StatusCode::ACCEPTED, Json(ExportTaskResponse::from(task))))
}

pub async fn get_export_task(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExportTaskResponse>, ApiErr> {
    let task = export_task::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Export task not found"))?;

    let user = load_user(&state, claims.sub).await?;
    if task.user_id != user.id && !user.is_superuser {
        return Err(ApiErr::forbidden("Access denied"));
    }
    Ok(Json(ExportTaskResponse::from(task)))
}
