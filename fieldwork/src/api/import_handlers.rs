use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::import::{self, CoordinateSystem, ImportError, ImportOptions};

use super::dataset_handlers::{load_dataset, require_access};
use super::{
    AppState, ApiErr, load_user,
    dto::{ImportPreviewRequest, ImportPreviewResponse, ImportResponse, RunImportRequest},
    jwt::AuthClaims,
};

/// Inspect an uploaded CSV: detected delimiter, header row, and a
/// warning list of IDs already present in the dataset.
pub async fn preview_import(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ImportPreviewRequest>,
) -> Result<Json<ImportPreviewResponse>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let preview = import::preview(&state.db, ds.id, &body.csv)
        .await
        .map_err(import_error_to_api)?;

    Ok(Json(ImportPreviewResponse {
        delimiter: preview.delimiter.to_string(),
        headers: preview.headers,
        id_conflicts: preview.id_conflicts,
    }))
}

pub async fn run_import(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RunImportRequest>,
) -> Result<Json<ImportResponse>, ApiErr> {
    let ds = load_dataset(&state, id).await?;
    let user = load_user(&state, claims.sub).await?;
    require_access(&state, &ds, &user).await?;

    let coordinate_system =
        CoordinateSystem::parse(&body.coordinate_system).map_err(ApiErr::bad_request)?;

    let options = ImportOptions {
        id_column: body.id_column,
        x_column: body.x_column,
        y_column: body.y_column,
        address_column: body.address_column,
        coordinate_system,
        clear_existing: body.clear_existing,
    };

    let report = import::import_csv(&state.db, &ds, user.id, &body.csv, &options)
        .await
        .map_err(import_error_to_api)?;

    let (visible, total) = report.visible_errors();
    Ok(Json(ImportResponse {
        imported: report.imported,
        cleared: report.cleared,
        errors: visible.to_vec(),
        total_errors: total,
    }))
}

fn import_error_to_api(e: ImportError) -> ApiErr {
    match e {
        ImportError::MissingColumn(_) | ImportError::Csv(_) => ApiErr::bad_request(e.to_string()),
        ImportError::Db(e) => ApiErr::internal(e),
    }
}
