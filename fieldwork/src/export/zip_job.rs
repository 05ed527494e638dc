//! File-bundle ZIP export worker.
//!
//! A request creates a pending export_task row and returns immediately;
//! the worker is a detached tokio task that drives the row through
//! processing into completed or failed (terminal either way) and then
//! notifies the requesting user.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::entity::export_task::ExportStatus;
use crate::entity::{app_user, dataset, entry, entry_file, export_task, geometry};
use crate::export::notify::Notifier;

/// Per-file name prefix strategy inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeBy {
    Geometry,
    Entry,
    Date,
    User,
    Type,
}

impl OrganizeBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "geometry" => Some(OrganizeBy::Geometry),
            "entry" => Some(OrganizeBy::Entry),
            "date" => Some(OrganizeBy::Date),
            "user" => Some(OrganizeBy::User),
            "type" => Some(OrganizeBy::Type),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizeBy::Geometry => "geometry",
            OrganizeBy::Entry => "entry",
            OrganizeBy::Date => "date",
            OrganizeBy::User => "user",
            OrganizeBy::Type => "type",
        }
    }
}

/// Request parameters for a file-bundle export.
#[derive(Debug, Clone)]
pub struct ExportParams {
    /// File type classes ("image", "document"); empty or containing
    /// "all" means no type filter.
    pub file_types: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub organize_by: OrganizeBy,
    pub include_metadata: bool,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            file_types: Vec::new(),
            date_from: None,
            date_to: None,
            organize_by: OrganizeBy::Geometry,
            include_metadata: true,
        }
    }
}

/// Persist a pending task row.
pub async fn create_task(
    db: &DatabaseConnection,
    dataset_id: Uuid,
    user_id: Uuid,
    params: &ExportParams,
) -> Result<export_task::Model, sea_orm::DbErr> {
    export_task::ActiveModel {
        id: Set(Uuid::now_v7()),
        dataset_id: Set(dataset_id),
        user_id: Set(user_id),
        status: Set(ExportStatus::Pending),
        file_types: Set(serde_json::to_string(&params.file_types).unwrap_or_else(|_| "[]".into())),
        date_from: Set(params.date_from),
        date_to: Set(params.date_to),
        organize_by: Set(params.organize_by.as_str().to_string()),
        include_metadata: Set(params.include_metadata),
        file_path: Set(None),
        file_size: Set(None),
        error_message: Set(None),
        created_at: Set(chrono::Utc::now().naive_utc()),
        completed_at: Set(None),
    }
    .insert(db)
    .await
}

/// Fire-and-forget: dispatch the worker for a pending task.
pub fn spawn(
    db: DatabaseConnection,
    task: export_task::Model,
    media_root: PathBuf,
    notifier: Arc<dyn Notifier>,
) {
    tokio::spawn(async move {
        let task_id = task.id;
        if let Err(e) = run_export(&db, task, &media_root, notifier).await {
            tracing::error!(task = %task_id, error = %e, "export worker crashed");
        }
    });
}

/// One file selected for the archive, joined with its entry/geometry
/// context for naming and the manifest.
struct SelectedFile {
    file: entry_file::Model,
    entry: entry::Model,
    geometry: geometry::Model,
    username: Option<String>,
}

/// Drive a task to its terminal state. Public for tests; `spawn` is the
/// production entry point.
pub async fn run_export(
    db: &DatabaseConnection,
    task: export_task::Model,
    media_root: &Path,
    notifier: Arc<dyn Notifier>,
) -> Result<(), sea_orm::DbErr> {
    let mut active: export_task::ActiveModel = task.clone().into();
    active.status = Set(ExportStatus::Processing);
    let task = active.update(db).await?;

    let ds = dataset::Entity::find_by_id(task.dataset_id).one(db).await?;
    let user = app_user::Entity::find_by_id(task.user_id).one(db).await?;
    let (Some(ds), Some(user)) = (ds, user) else {
        fail_task(db, task, "Dataset or user no longer exists", None, None).await?;
        return Ok(());
    };

    match build_archive(db, &task, &ds, media_root).await {
        Ok((file_path, file_size)) => {
            let mut active: export_task::ActiveModel = task.clone().into();
            active.status = Set(ExportStatus::Completed);
            active.file_path = Set(Some(file_path));
            active.file_size = Set(Some(file_size));
            active.completed_at = Set(Some(chrono::Utc::now().naive_utc()));
            let task = active.update(db).await?;
            tracing::info!(task = %task.id, dataset = %ds.name, size = file_size, "export completed");
            notifier.export_completed(&user, &ds.name, &task).await;
        }
        Err(message) => {
            let task = fail_task(db, task, &message, Some(&user), Some(&ds.name)).await?;
            notifier.export_failed(&user, &ds.name, &task, &message).await;
        }
    }
    Ok(())
}

async fn fail_task(
    db: &DatabaseConnection,
    task: export_task::Model,
    message: &str,
    user: Option<&app_user::Model>,
    dataset_name: Option<&str>,
) -> Result<export_task::Model, sea_orm::DbErr> {
    tracing::warn!(
        task = %task.id,
        user = user.map(|u| u.username.as_str()).unwrap_or("?"),
        dataset = dataset_name.unwrap_or("?"),
        error = %message,
        "export failed"
    );
    let mut active: export_task::ActiveModel = task.into();
    active.status = Set(ExportStatus::Failed);
    active.error_message = Set(Some(message.to_string()));
    active.completed_at = Set(Some(chrono::Utc::now().naive_utc()));
    active.update(db).await
}

async fn build_archive(
    db: &DatabaseConnection,
    task: &export_task::Model,
    ds: &dataset::Model,
    media_root: &Path,
) -> Result<(String, i64), String> {
    let selected = select_files(db, task, ds.id)
        .await
        .map_err(|e| format!("Database error: {e}"))?;
    if selected.is_empty() {
        return Err("No files found matching the specified criteria".to_string());
    }

    let organize_by = OrganizeBy::parse(&task.organize_by).unwrap_or(OrganizeBy::Geometry);

    let export_dir = media_root.join("exports").join(task.id.to_string());
    std::fs::create_dir_all(&export_dir).map_err(|e| format!("Cannot create export dir: {e}"))?;

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let zip_name = format!("{}_files_{}.zip", ds.name.replace(['/', '\\'], "_"), timestamp);
    let zip_path = export_dir.join(&zip_name);

    let file = std::fs::File::create(&zip_path).map_err(|e| format!("Cannot create ZIP: {e}"))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut skipped = 0usize;
    for sel in &selected {
        let source = media_root.join(&sel.file.file_path);
        let bytes = match std::fs::read(&source) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(file = %sel.file.filename, error = %e, "skipping unreadable file");
                skipped += 1;
                continue;
            }
        };
        let name = prefixed_filename(sel, organize_by);
        zip.start_file(name, options)
            .map_err(|e| format!("ZIP error: {e}"))?;
        zip.write_all(&bytes).map_err(|e| format!("ZIP error: {e}"))?;
    }
    if skipped == selected.len() {
        // Close and remove the empty archive before failing.
        let _ = zip.finish();
        let _ = std::fs::remove_file(&zip_path);
        return Err("None of the selected files could be read".to_string());
    }

    if task.include_metadata {
        write_metadata(&mut zip, &selected, ds, organize_by, options)?;
    }

    zip.finish().map_err(|e| format!("ZIP error: {e}"))?;

    let size = std::fs::metadata(&zip_path)
        .map(|m| m.len() as i64)
        .map_err(|e| format!("Cannot stat ZIP: {e}"))?;
    let relative = format!("exports/{}/{}", task.id, zip_name);
    Ok((relative, size))
}

async fn select_files(
    db: &DatabaseConnection,
    task: &export_task::Model,
    dataset_id: Uuid,
) -> Result<Vec<SelectedFile>, sea_orm::DbErr> {
    let geometries = geometry::Entity::find()
        .filter(geometry::Column::DatasetId.eq(dataset_id))
        .all(db)
        .await?;
    let geom_by_id: BTreeMap<Uuid, geometry::Model> =
        geometries.into_iter().map(|g| (g.id, g)).collect();

    let entries = entry::Entity::find()
        .filter(entry::Column::GeometryId.is_in(geom_by_id.keys().copied().collect::<Vec<_>>()))
        .all(db)
        .await?;
    let entry_by_id: BTreeMap<Uuid, entry::Model> =
        entries.into_iter().map(|e| (e.id, e)).collect();

    let files = entry_file::Entity::find()
        .filter(entry_file::Column::EntryId.is_in(entry_by_id.keys().copied().collect::<Vec<_>>()))
        .all(db)
        .await?;

    let type_filter: Vec<String> = serde_json::from_str(&task.file_types).unwrap_or_default();
    let filter_active = !type_filter.is_empty() && !type_filter.iter().any(|t| t == "all");
    let want_images = type_filter.iter().any(|t| t == "image");
    let want_documents = type_filter.iter().any(|t| t == "document");

    let user_ids: Vec<Uuid> = files.iter().filter_map(|f| f.upload_user_id).collect();
    let users: BTreeMap<Uuid, String> = if user_ids.is_empty() {
        BTreeMap::new()
    } else {
        app_user::Entity::find()
            .filter(app_user::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect()
    };

    let mut selected: Vec<SelectedFile> = Vec::new();
    for file in files {
        if filter_active {
            let is_image = file.is_image();
            if !(want_images && is_image || want_documents && !is_image) {
                continue;
            }
        }
        let upload_date = file.uploaded_at.date();
        if let Some(from) = task.date_from
            && upload_date < from
        {
            continue;
        }
        if let Some(to) = task.date_to
            && upload_date > to
        {
            continue;
        }

        let Some(entry) = entry_by_id.get(&file.entry_id).cloned() else {
            continue;
        };
        let Some(geometry) = geom_by_id.get(&entry.geometry_id).cloned() else {
            continue;
        };
        let username = file.upload_user_id.and_then(|id| users.get(&id).cloned());
        selected.push(SelectedFile {
            file,
            entry,
            geometry,
            username,
        });
    }

    selected.sort_by(|a, b| {
        (&a.geometry.id_kurz, a.file.uploaded_at).cmp(&(&b.geometry.id_kurz, b.file.uploaded_at))
    });
    Ok(selected)
}

/// Archive-internal name: the original filename prefixed according to
/// the organize-by strategy.
fn prefixed_filename(sel: &SelectedFile, organize_by: OrganizeBy) -> String {
    let geometry_id = &sel.geometry.id_kurz;
    let filename = &sel.file.filename;

    match organize_by {
        OrganizeBy::Geometry => format!("geometry_{geometry_id}_{filename}"),
        OrganizeBy::Entry => format!("entry_{}_{filename}", sel.entry.id),
        OrganizeBy::Date => format!(
            "{}_geometry_{geometry_id}_{filename}",
            sel.file.uploaded_at.format("%Y-%m-%d")
        ),
        OrganizeBy::User => format!(
            "user_{}_geometry_{geometry_id}_{filename}",
            sel.username.as_deref().unwrap_or("unknown")
        ),
        OrganizeBy::Type => format!(
            "{}_geometry_{geometry_id}_{filename}",
            sel.file.file_type.split('/').next().unwrap_or("file")
        ),
    }
}

fn write_metadata(
    zip: &mut zip::ZipWriter<std::fs::File>,
    selected: &[SelectedFile],
    ds: &dataset::Model,
    organize_by: OrganizeBy,
    options: FileOptions,
) -> Result<(), String> {
    let manifest: Vec<serde_json::Value> = selected
        .iter()
        .map(|sel| {
            serde_json::json!({
                "file_id": sel.file.id,
                "original_filename": sel.file.filename,
                "prefixed_filename": prefixed_filename(sel, organize_by),
                "file_type": sel.file.file_type,
                "file_size": sel.file.file_size,
                "upload_date": sel.file.uploaded_at.to_string(),
                "upload_user": sel.username.as_deref().unwrap_or("Unknown"),
                "geometry_id": sel.geometry.id_kurz,
                "entry_id": sel.entry.id,
                "entry_name": sel.entry.name,
                "geometry_address": sel.geometry.address,
                "description": sel.file.description.as_deref().unwrap_or(""),
            })
        })
        .collect();

    let write_text = |zip: &mut zip::ZipWriter<std::fs::File>, name: &str, text: &str| {
        zip.start_file(name, options)
            .and_then(|_| zip.write_all(text.as_bytes()).map_err(Into::into))
            .map_err(|e| format!("ZIP error: {e}"))
    };

    let manifest_json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| format!("Manifest error: {e}"))?;
    write_text(zip, "files_manifest.json", &manifest_json)?;

    // CSV manifest with the same columns.
    let mut csv_writer = csv::Writer::from_writer(Vec::new());
    csv_writer
        .write_record([
            "original_filename",
            "prefixed_filename",
            "file_type",
            "file_size",
            "upload_date",
            "upload_user",
            "geometry_id",
            "entry_name",
            "geometry_address",
        ])
        .map_err(|e| format!("Manifest error: {e}"))?;
    for sel in selected {
        csv_writer
            .write_record([
                sel.file.filename.as_str(),
                &prefixed_filename(sel, organize_by),
                sel.file.file_type.as_str(),
                &sel.file.file_size.to_string(),
                &sel.file.uploaded_at.to_string(),
                sel.username.as_deref().unwrap_or("Unknown"),
                sel.geometry.id_kurz.as_str(),
                sel.entry.name.as_deref().unwrap_or(""),
                sel.geometry.address.as_str(),
            ])
            .map_err(|e| format!("Manifest error: {e}"))?;
    }
    let manifest_csv = String::from_utf8(
        csv_writer
            .into_inner()
            .map_err(|e| format!("Manifest error: {e}"))?,
    )
    .map_err(|e| format!("Manifest error: {e}"))?;
    write_text(zip, "files_manifest.csv", &manifest_csv)?;

    // Summary statistics.
    let total_size: i64 = selected.iter().map(|s| s.file.file_size).sum();
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_user: BTreeMap<String, usize> = BTreeMap::new();
    for sel in selected {
        let class = sel.file.file_type.split('/').next().unwrap_or("file");
        *by_type.entry(class.to_string()).or_default() += 1;
        *by_user
            .entry(sel.username.clone().unwrap_or_else(|| "Unknown".to_string()))
            .or_default() += 1;
    }
    let summary = serde_json::json!({
        "dataset_name": ds.name,
        "dataset_id": ds.id,
        "export_date": chrono::Utc::now().naive_utc().to_string(),
        "total_files": selected.len(),
        "total_size_bytes": total_size,
        "file_types": by_type,
        "users": by_user,
        "organization_method": organize_by.as_str(),
    });
    write_text(
        zip,
        "dataset_summary.json",
        &serde_json::to_string_pretty(&summary).map_err(|e| format!("Manifest error: {e}"))?,
    )?;

    let readme = format!(
        "# Dataset Files Export: {}\n\n\
         - Total files: {}\n\
         - Total size: {} bytes\n\
         - Organization method: {}\n\n\
         Files are prefixed with geometry/entry identifiers. See\n\
         `files_manifest.json` / `files_manifest.csv` for per-file details\n\
         and `dataset_summary.json` for export statistics.\n",
        ds.name,
        selected.len(),
        total_size,
        organize_by.as_str()
    );
    write_text(zip, "README.md", &readme)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;
    use async_trait::async_trait;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use std::sync::Mutex;

    struct RecordingNotifier {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn export_completed(
            &self,
            user: &app_user::Model,
            dataset_name: &str,
            _task: &export_task::Model,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("completed:{}:{dataset_name}", user.username));
        }

        async fn export_failed(
            &self,
            user: &app_user::Model,
            dataset_name: &str,
            _task: &export_task::Model,
            error: &str,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failed:{}:{dataset_name}:{error}", user.username));
        }
    }

    async fn setup() -> (DatabaseConnection, dataset::Model, app_user::Model) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let now = chrono::Utc::now().naive_utc();
        let user = app_user::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set("requester".to_string()),
            password_hash: Set("hash".to_string()),
            is_superuser: Set(false),
            is_active: Set(true),
            email: Set(Some("requester@example.org".to_string())),
            display_name: Set(None),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        let ds = dataset::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set("Survey".to_string()),
            description: Set(None),
            owner_id: Set(user.id),
            is_public: Set(false),
            allow_multiple_entries: Set(true),
            enable_mapping_areas: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        (db, ds, user)
    }

    async fn add_file(
        db: &DatabaseConnection,
        entry_id: Uuid,
        media_root: &Path,
        rel_path: &str,
        filename: &str,
        file_type: &str,
        content: &[u8],
    ) -> entry_file::Model {
        let full = media_root.join(rel_path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(&full, content).unwrap();

        entry_file::ActiveModel {
            id: Set(Uuid::now_v7()),
            entry_id: Set(entry_id),
            file_path: Set(rel_path.to_string()),
            filename: Set(filename.to_string()),
            file_type: Set(file_type.to_string()),
            file_size: Set(content.len() as i64),
            upload_user_id: Set(None),
            description: Set(None),
            uploaded_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_export_lifecycle_completed() {
        let (db, ds, user) = setup().await;
        let media = tempfile::tempdir().unwrap();

        let geom = data::create_geometry(&db, ds.id, "A1", "Addr", 1.0, 2.0, None)
            .await
            .unwrap();
        let e = data::create_entry(&db, geom.id, Some("e".to_string()), None, None, true)
            .await
            .unwrap();
        add_file(&db, e.id, media.path(), "uploads/a.jpg", "a.jpg", "image/jpeg", b"jpegdata").await;
        add_file(&db, e.id, media.path(), "uploads/b.pdf", "b.pdf", "application/pdf", b"pdfdata")
            .await;

        let task = create_task(&db, ds.id, user.id, &ExportParams::default())
            .await
            .unwrap();
        assert_eq!(task.status, ExportStatus::Pending);

        let notifier = Arc::new(RecordingNotifier {
            events: Mutex::new(Vec::new()),
        });
        run_export(&db, task.clone(), media.path(), notifier.clone())
            .await
            .unwrap();

        let done = export_task::Entity::find_by_id(task.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.status, ExportStatus::Completed);
        assert!(done.completed_at.is_some());
        let rel = done.file_path.unwrap();
        let zip_path = media.path().join(&rel);
        assert!(zip_path.exists());
        assert_eq!(done.file_size.unwrap(), zip_path.metadata().unwrap().len() as i64);

        // Archive contains both files (prefixed) plus the four metadata
        // documents.
        let archive =
            zip::ZipArchive::new(std::fs::File::open(&zip_path).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"geometry_A1_a.jpg"));
        assert!(names.contains(&"geometry_A1_b.pdf"));
        for meta in [
            "files_manifest.json",
            "files_manifest.csv",
            "dataset_summary.json",
            "README.md",
        ] {
            assert!(names.contains(&meta), "missing {meta}");
        }

        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], "completed:requester:Survey");
    }

    #[tokio::test]
    async fn test_image_filter() {
        let (db, ds, user) = setup().await;
        let media = tempfile::tempdir().unwrap();

        let geom = data::create_geometry(&db, ds.id, "A1", "Addr", 1.0, 2.0, None)
            .await
            .unwrap();
        let e = data::create_entry(&db, geom.id, None, None, None, true).await.unwrap();
        add_file(&db, e.id, media.path(), "uploads/a.jpg", "a.jpg", "image/jpeg", b"x").await;
        add_file(&db, e.id, media.path(), "uploads/b.pdf", "b.pdf", "application/pdf", b"y").await;

        let params = ExportParams {
            file_types: vec!["image".to_string()],
            include_metadata: false,
            ..Default::default()
        };
        let task = create_task(&db, ds.id, user.id, &params).await.unwrap();
        let notifier = Arc::new(RecordingNotifier {
            events: Mutex::new(Vec::new()),
        });
        run_export(&db, task.clone(), media.path(), notifier).await.unwrap();

        let done = export_task::Entity::find_by_id(task.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let zip_path = media.path().join(done.file_path.unwrap());
        let archive = zip::ZipArchive::new(std::fs::File::open(&zip_path).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names, vec!["geometry_A1_a.jpg"]);
    }

    #[tokio::test]
    async fn test_no_files_fails_task() {
        let (db, ds, user) = setup().await;
        let media = tempfile::tempdir().unwrap();

        let task = create_task(&db, ds.id, user.id, &ExportParams::default())
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier {
            events: Mutex::new(Vec::new()),
        });
        run_export(&db, task.clone(), media.path(), notifier.clone())
            .await
            .unwrap();

        let done = export_task::Entity::find_by_id(task.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.status, ExportStatus::Failed);
        assert!(done.error_message.unwrap().contains("No files found"));
        assert!(done.completed_at.is_some());

        let events = notifier.events.lock().unwrap();
        assert!(events[0].starts_with("failed:requester:Survey"));
    }

    #[tokio::test]
    async fn test_organize_by_prefixes() {
        let (db, ds, _user) = setup().await;
        let geom = data::create_geometry(&db, ds.id, "A1", "Addr", 1.0, 2.0, None)
            .await
            .unwrap();
        let e = data::create_entry(&db, geom.id, None, None, None, true).await.unwrap();
        let now = chrono::Utc::now().naive_utc();
        let file = entry_file::Model {
            id: Uuid::now_v7(),
            entry_id: e.id,
            file_path: "uploads/p.jpg".to_string(),
            filename: "p.jpg".to_string(),
            file_type: "image/jpeg".to_string(),
            file_size: 3,
            upload_user_id: None,
            description: None,
            uploaded_at: now,
        };
        let sel = SelectedFile {
            file,
            entry: e,
            geometry: geom,
            username: Some("anna".to_string()),
        };

        assert_eq!(prefixed_filename(&sel, OrganizeBy::Geometry), "geometry_A1_p.jpg");
        assert_eq!(
            prefixed_filename(&sel, OrganizeBy::Entry),
            format!("entry_{}_p.jpg", sel.entry.id)
        );
        assert_eq!(
            prefixed_filename(&sel, OrganizeBy::Date),
            format!("{}_geometry_A1_p.jpg", now.format("%Y-%m-%d"))
        );
        assert_eq!(
            prefixed_filename(&sel, OrganizeBy::User),
            "user_anna_geometry_A1_p.jpg"
        );
        assert_eq!(
            prefixed_filename(&sel, OrganizeBy::Type),
            "image_geometry_A1_p.jpg"
        );
    }
}
