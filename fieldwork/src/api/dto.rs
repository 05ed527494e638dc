use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::codec::TypedValue;
use crate::entity::{
    app_user, dataset, dataset_field, entry, export_task, geometry, typology, typology_entry,
};
use crate::schema::ChoiceOption;

// ---------- auth ----------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl From<app_user::Model> for UserResponse {
    fn from(m: app_user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            is_superuser: m.is_superuser,
            is_active: m.is_active,
            email: m.email,
            display_name: m.display_name,
            last_login_at: m.last_login_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

// ---------- datasets ----------

#[derive(Debug, Deserialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub allow_multiple_entries: bool,
    #[serde(default)]
    pub enable_mapping_areas: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDatasetRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub allow_multiple_entries: Option<bool>,
    pub enable_mapping_areas: Option<bool>,
    /// Full replacement of the shared-user set when present.
    pub shared_user_ids: Option<Vec<Uuid>>,
    /// Full replacement of the shared-group set when present.
    pub shared_group_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct ListDatasetsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub is_public: bool,
    pub allow_multiple_entries: bool,
    pub enable_mapping_areas: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<dataset::Model> for DatasetResponse {
    fn from(m: dataset::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            owner_id: m.owner_id,
            is_public: m.is_public,
            allow_multiple_entries: m.allow_multiple_entries,
            enable_mapping_areas: m.enable_mapping_areas,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ---------- field schema ----------

#[derive(Debug, Deserialize)]
pub struct CreateFieldRequest {
    pub label: String,
    /// Internal name; derived from the label when absent.
    pub field_name: Option<String>,
    #[serde(default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub help_text: Option<String>,
    pub choices: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    pub typology_id: Option<Uuid>,
    pub typology_category: Option<String>,
}

fn default_field_type() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub label: Option<String>,
    pub field_type: Option<String>,
    pub required: Option<bool>,
    pub enabled: Option<bool>,
    pub help_text: Option<String>,
    pub choices: Option<String>,
    pub order_index: Option<i32>,
    pub typology_id: Option<Option<Uuid>>,
    pub typology_category: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub id: Uuid,
    pub field_name: String,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub enabled: bool,
    pub non_editable: bool,
    pub help_text: Option<String>,
    pub order_index: i32,
    pub is_coordinate_field: bool,
    pub is_id_field: bool,
    pub is_address_field: bool,
    pub typology_id: Option<Uuid>,
    pub typology_category: Option<String>,
    /// Resolved per the typology-over-manual precedence rule.
    pub choices: Vec<ChoiceOption>,
}

impl FieldResponse {
    pub fn from_model(m: dataset_field::Model, choices: Vec<ChoiceOption>) -> Self {
        Self {
            id: m.id,
            field_name: m.field_name,
            label: m.label,
            field_type: m.field_type,
            required: m.required,
            enabled: m.enabled,
            non_editable: m.non_editable,
            help_text: m.help_text,
            order_index: m.order_index,
            is_coordinate_field: m.is_coordinate_field,
            is_id_field: m.is_id_field,
            is_address_field: m.is_address_field,
            typology_id: m.typology_id,
            typology_category: m.typology_category,
            choices,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RepairFieldsResponse {
    pub enabled: u64,
}

// ---------- typologies ----------

#[derive(Debug, Deserialize)]
pub struct CreateTypologyRequest {
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct TypologyResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Option<Uuid>,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
}

impl From<typology::Model> for TypologyResponse {
    fn from(m: typology::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            owner_id: m.owner_id,
            is_public: m.is_public,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddTypologyEntryRequest {
    pub code: i32,
    pub category: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TypologyEntryResponse {
    pub id: Uuid,
    pub code: i32,
    pub category: String,
    pub name: String,
}

impl From<typology_entry::Model> for TypologyEntryResponse {
    fn from(m: typology_entry::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            category: m.category,
            name: m.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportTypologyEntriesRequest {
    pub csv: String,
}

#[derive(Debug, Serialize)]
pub struct TypologyImportResponse {
    pub imported: usize,
    pub errors: Vec<String>,
}

// ---------- geometries and entries ----------

#[derive(Debug, Deserialize)]
pub struct CreateGeometryRequest {
    pub id_kurz: String,
    pub address: Option<String>,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Serialize)]
pub struct GeometryResponse {
    pub id: Uuid,
    pub id_kurz: String,
    pub address: String,
    pub lon: f64,
    pub lat: f64,
    pub user_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

impl From<geometry::Model> for GeometryResponse {
    fn from(m: geometry::Model) -> Self {
        Self {
            id: m.id,
            id_kurz: m.id_kurz,
            address: m.address,
            lon: m.lon,
            lat: m.lat,
            user_id: m.user_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MapDataResponse {
    pub map_data: Vec<GeometryResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: Uuid,
    pub geometry_id: Uuid,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl From<entry::Model> for EntryResponse {
    fn from(m: entry::Model) -> Self {
        Self {
            id: m.id,
            geometry_id: m.geometry_id,
            name: m.name,
            year: m.year,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetEntryValuesRequest {
    /// field_name → raw value; null clears the value.
    pub values: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct EntryValuesResponse {
    pub values: BTreeMap<String, TypedValue>,
}

// ---------- CSV import ----------

#[derive(Debug, Deserialize)]
pub struct ImportPreviewRequest {
    pub csv: String,
}

#[derive(Debug, Serialize)]
pub struct ImportPreviewResponse {
    pub delimiter: String,
    pub headers: Vec<String>,
    pub id_conflicts: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunImportRequest {
    pub csv: String,
    pub id_column: String,
    pub x_column: String,
    pub y_column: String,
    pub address_column: Option<String>,
    /// "auto" or an EPSG code.
    #[serde(default = "default_coordinate_system")]
    pub coordinate_system: String,
    #[serde(default)]
    pub clear_existing: bool,
}

fn default_coordinate_system() -> String {
    "auto".to_string()
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub cleared: u64,
    /// First errors verbatim; the rest only counted.
    pub errors: Vec<String>,
    pub total_errors: usize,
}

// ---------- exports ----------

#[derive(Debug, Deserialize)]
pub struct CreateFileExportRequest {
    #[serde(default)]
    pub file_types: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    #[serde(default = "default_organize_by")]
    pub organize_by: String,
    #[serde(default = "default_true")]
    pub include_metadata: bool,
}

fn default_organize_by() -> String {
    "geometry".to_string()
}

#[derive(Debug, Serialize)]
pub struct ExportTaskResponse {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub status: String,
    pub organize_by: String,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl From<export_task::Model> for ExportTaskResponse {
    fn from(m: export_task::Model) -> Self {
        Self {
            id: m.id,
            dataset_id: m.dataset_id,
            status: m.status.as_str().to_string(),
            organize_by: m.organize_by,
            file_path: m.file_path,
            file_size: m.file_size,
            error_message: m.error_message,
            created_at: m.created_at,
            completed_at: m.completed_at,
        }
    }
}

// ---------- mapping areas ----------

#[derive(Debug, Deserialize)]
pub struct CreateAreaRequest {
    pub name: String,
    /// Exterior ring as [[lon, lat], ...]; auto-closed.
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    pub allocated_users: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAreaRequest {
    pub name: Option<String>,
    pub coordinates: Option<Vec<[f64; 2]>>,
    pub allocated_users: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct SetAllocationsRequest {
    /// Users limited to this area within the dataset.
    #[serde(default)]
    pub user_ids: Vec<Uuid>,
    /// Groups limited to this area within the dataset.
    #[serde(default)]
    pub group_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AreaResponse {
    pub id: Uuid,
    pub name: String,
    pub ring: Vec<(f64, f64)>,
    pub point_count: usize,
    pub allocated_users: Vec<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
}
