use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::set_header::response::SetResponseHeaderLayer;
use uuid::Uuid;

use crate::auth::Auth;
use crate::entity::app_user;
use crate::export::notify::Notifier;

pub mod area_handlers;
pub mod auth_handlers;
pub mod data_handlers;
pub mod dataset_handlers;
pub mod dto;
pub mod export_handlers;
pub mod field_handlers;
pub mod import_handlers;
pub mod jwt;
pub mod typology_handlers;

// ---------- shared state ----------

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Root directory for uploaded files and generated exports.
    pub media_root: PathBuf,
    pub notifier: Arc<dyn Notifier>,
}

// ---------- error type ----------

/// A JSON error response: `{"error": "..."}` with an HTTP status.
pub struct ApiErr(StatusCode, String);

impl ApiErr {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self(status, msg.into())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self(StatusCode::CONFLICT, msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self(StatusCode::FORBIDDEN, msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, msg.into())
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

/// Resolve the acting user behind a validated token.
pub async fn load_user(state: &AppState, user_id: Uuid) -> Result<app_user::Model, ApiErr> {
    app_user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::new(StatusCode::UNAUTHORIZED, "User no longer exists"))
}

// ---------- router ----------

pub fn app_router(state: AppState) -> Router {
    let allowed_origins: Vec<HeaderValue> = std::env::var("FW_CORS_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new() // no origins allowed = same-origin only
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .nest("/api/v1", api_v1())
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .with_state(state)
}

fn api_v1() -> Router<AppState> {
    Router::new()
        // auth
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/me", get(auth_handlers::me))
        // datasets
        .route(
            "/datasets",
            get(dataset_handlers::list_datasets).post(dataset_handlers::create_dataset),
        )
        .route(
            "/datasets/{id}",
            get(dataset_handlers::get_dataset)
                .put(dataset_handlers::update_dataset)
                .delete(dataset_handlers::delete_dataset),
        )
        .route("/datasets/{id}/map-data", get(dataset_handlers::map_data))
        // field schema
        .route(
            "/datasets/{id}/fields",
            get(field_handlers::list_fields).post(field_handlers::create_field),
        )
        .route(
            "/datasets/{id}/fields/{field_id}",
            put(field_handlers::update_field).delete(field_handlers::delete_field),
        )
        .route(
            "/datasets/{id}/fields/repair",
            post(field_handlers::repair_fields),
        )
        // typologies
        .route(
            "/typologies",
            get(typology_handlers::list_typologies).post(typology_handlers::create_typology),
        )
        .route(
            "/typologies/{id}",
            get(typology_handlers::get_typology).delete(typology_handlers::delete_typology),
        )
        .route(
            "/typologies/{id}/entries",
            get(typology_handlers::list_entries).post(typology_handlers::add_entry),
        )
        .route(
            "/typologies/{id}/entries/import",
            post(typology_handlers::import_entries),
        )
        // geometries and entries
        .route(
            "/datasets/{id}/geometries",
            get(data_handlers::list_geometries).post(data_handlers::create_geometry),
        )
        .route("/geometries/{id}", get(data_handlers::get_geometry))
        .route("/geometries/{id}/entries", post(data_handlers::create_entry))
        .route(
            "/entries/{id}/values",
            get(data_handlers::get_entry_values).put(data_handlers::set_entry_values),
        )
        // CSV import
        .route(
            "/datasets/{id}/import/preview",
            post(import_handlers::preview_import),
        )
        .route("/datasets/{id}/import", post(import_handlers::run_import))
        // exports
        .route("/datasets/{id}/export/csv", get(export_handlers::export_csv))
        .route(
            "/datasets/{id}/export/files",
            post(export_handlers::create_file_export),
        )
        .route("/export-tasks/{id}", get(export_handlers::get_export_task))
        // mapping areas
        .route(
            "/datasets/{id}/mapping-areas",
            get(area_handlers::list_areas).post(area_handlers::create_area),
        )
        .route(
            "/datasets/{id}/mapping-areas/{area_id}",
            put(area_handlers::update_area).delete(area_handlers::delete_area),
        )
        .route(
            "/datasets/{id}/mapping-areas/{area_id}/allocations",
            put(area_handlers::set_allocations),
        )
}
