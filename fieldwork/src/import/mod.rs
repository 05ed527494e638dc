//! CSV import engine.
//!
//! Import runs in two passes over the uploaded text: a read-only
//! conflict pass that decides which row identifiers are eligible, then a
//! transactional ingestion pass that materializes schema rows, geometry
//! points, entries and field values. Validation problems are accumulated
//! per row and never abort the import; a database failure rolls the
//! whole ingestion pass back.

pub mod delimiter;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::codec::FieldType;
use crate::data;
use crate::entity::{dataset, geometry};
use crate::schema;

use delimiter::{DEFAULT_SAMPLE_SIZE, detect_delimiter};

/// How many errors are surfaced verbatim to the caller; the rest are
/// summarized as a count.
pub const MAX_VISIBLE_ERRORS: usize = 10;

/// Column names probed when previewing a file before the user has picked
/// an ID column.
const COMMON_ID_COLUMNS: &[&str] = &["id", "ID", "id_kurz", "ID_KURZ", "geometry_id", "GEOMETRY_ID"];

/// Source coordinate reference system for an import.
///
/// `Auto` means the data is taken as already-WGS84; no range sniffing is
/// performed. An explicit EPSG code is accepted and recorded but the
/// import path performs no transformation — callers with projected
/// source data must convert beforehand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    Auto,
    Epsg(u32),
}

impl CoordinateSystem {
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(CoordinateSystem::Auto);
        }
        s.parse::<u32>()
            .map(CoordinateSystem::Epsg)
            .map_err(|_| format!("Invalid coordinate system \"{s}\" (expected \"auto\" or an EPSG code)"))
    }

    pub fn srid(&self) -> u32 {
        match self {
            CoordinateSystem::Auto => 4326,
            CoordinateSystem::Epsg(code) => *code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub id_column: String,
    pub x_column: String,
    pub y_column: String,
    pub address_column: Option<String>,
    pub coordinate_system: CoordinateSystem,
    /// Delete all of the dataset's geometries before the conflict pass,
    /// resetting the per-dataset uniqueness scope.
    pub clear_existing: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            id_column: "ID".to_string(),
            x_column: "X".to_string(),
            y_column: "Y".to_string(),
            address_column: None,
            coordinate_system: CoordinateSystem::Auto,
            clear_existing: false,
        }
    }
}

#[derive(Debug)]
pub enum ImportError {
    /// A designated role column is absent from the header.
    MissingColumn(String),
    Csv(csv::Error),
    Db(sea_orm::DbErr),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::MissingColumn(name) => write!(f, "Column \"{name}\" not found in CSV"),
            ImportError::Csv(e) => write!(f, "CSV error: {e}"),
            ImportError::Db(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<sea_orm::DbErr> for ImportError {
    fn from(e: sea_orm::DbErr) -> Self {
        ImportError::Db(e)
    }
}

impl From<csv::Error> for ImportError {
    fn from(e: csv::Error) -> Self {
        ImportError::Csv(e)
    }
}

/// Outcome of an import: good rows landed, bad rows are listed.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub cleared: u64,
    pub errors: Vec<String>,
}

impl ImportReport {
    /// First N error messages plus the total, for bounded user-facing
    /// reporting.
    pub fn visible_errors(&self) -> (&[String], usize) {
        let n = self.errors.len().min(MAX_VISIBLE_ERRORS);
        (&self.errors[..n], self.errors.len())
    }
}

/// Pre-import preview: detected delimiter, header row, and a warning
/// list of IDs (sampled from the first rows under common ID column
/// names) that already exist in the dataset.
#[derive(Debug)]
pub struct ImportPreview {
    pub delimiter: char,
    pub headers: Vec<String>,
    pub id_conflicts: Vec<String>,
}

fn make_reader(text: &str, delimiter: char) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Inspect an uploaded file before column selection.
pub async fn preview(
    db: &DatabaseConnection,
    dataset_id: Uuid,
    text: &str,
) -> Result<ImportPreview, ImportError> {
    let delimiter = detect_delimiter(text, DEFAULT_SAMPLE_SIZE);
    let mut reader = make_reader(text, delimiter);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    // Probe the first rows for a recognizable ID column and collect a
    // sample of values.
    let id_idx = COMMON_ID_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name));

    let mut sample_ids = Vec::new();
    if let Some(idx) = id_idx {
        for record in reader.records().take(10) {
            let record = record?;
            if let Some(value) = record.get(idx) {
                let value = value.trim();
                if !value.is_empty() {
                    sample_ids.push(value.to_string());
                }
            }
        }
    }

    let id_conflicts = if sample_ids.is_empty() {
        Vec::new()
    } else {
        geometry::Entity::find()
            .filter(geometry::Column::DatasetId.eq(dataset_id))
            .filter(geometry::Column::IdKurz.is_in(sample_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| g.id_kurz)
            .collect()
    };

    Ok(ImportPreview {
        delimiter,
        headers,
        id_conflicts,
    })
}

/// Run a full CSV import for a dataset.
pub async fn import_csv(
    db: &DatabaseConnection,
    dataset: &dataset::Model,
    user_id: Uuid,
    text: &str,
    options: &ImportOptions,
) -> Result<ImportReport, ImportError> {
    let delimiter = detect_delimiter(text, DEFAULT_SAMPLE_SIZE);
    tracing::info!(
        dataset = %dataset.id,
        delimiter = %delimiter.escape_default(),
        srid = options.coordinate_system.srid(),
        "starting CSV import"
    );

    let mut report = ImportReport::default();

    if options.clear_existing {
        report.cleared = data::clear_dataset_geometries(db, dataset.id).await?;
        tracing::info!(dataset = %dataset.id, count = report.cleared, "cleared existing geometries");
    }

    // Resolve role columns against the header.
    let mut reader = make_reader(text, delimiter);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let col_idx = |name: &str| headers.iter().position(|h| h == name);

    let id_idx = col_idx(&options.id_column)
        .ok_or_else(|| ImportError::MissingColumn(options.id_column.clone()))?;
    let x_idx = col_idx(&options.x_column)
        .ok_or_else(|| ImportError::MissingColumn(options.x_column.clone()))?;
    let y_idx = col_idx(&options.y_column)
        .ok_or_else(|| ImportError::MissingColumn(options.y_column.clone()))?;
    let address_idx = match &options.address_column {
        Some(name) => {
            Some(col_idx(name).ok_or_else(|| ImportError::MissingColumn(name.clone()))?)
        }
        None => None,
    };
    let role_idx: HashSet<usize> = [Some(id_idx), Some(x_idx), Some(y_idx), address_idx]
        .into_iter()
        .flatten()
        .collect();

    // ── Conflict pass ────────────────────────────────────────────────
    // Header is row 1; data rows are numbered from 2.
    let mut all_ids: Vec<(usize, String)> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if let Some(value) = record.get(id_idx) {
            let value = value.trim();
            if !value.is_empty() {
                all_ids.push((i + 2, value.to_string()));
            }
        }
    }

    let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
    for (row_num, id) in &all_ids {
        if let Some(first_row) = first_occurrence.get(id.as_str()) {
            report.errors.push(format!(
                "Row {row_num}: Duplicate ID \"{id}\" within CSV (first occurrence at row {first_row})"
            ));
        } else {
            first_occurrence.insert(id.as_str(), *row_num);
        }
    }

    let existing_ids: HashSet<String> = geometry::Entity::find()
        .filter(geometry::Column::DatasetId.eq(dataset.id))
        .filter(
            geometry::Column::IdKurz
                .is_in(all_ids.iter().map(|(_, id)| id.clone()).collect::<Vec<_>>()),
        )
        .all(db)
        .await?
        .into_iter()
        .map(|g| g.id_kurz)
        .collect();

    let mut valid_ids: HashSet<String> = HashSet::new();
    for (row_num, id) in &all_ids {
        if existing_ids.contains(id) {
            // Report the conflict once, at the first occurrence.
            if first_occurrence.get(id.as_str()) == Some(row_num) {
                report
                    .errors
                    .push(format!("Row {row_num}: ID \"{id}\" already exists in this dataset"));
            }
        } else {
            valid_ids.insert(id.clone());
        }
    }

    // ── Ingestion pass ───────────────────────────────────────────────
    // One transaction for all rows: validation errors skip the row,
    // database errors roll everything back.
    let txn = db.begin().await?;
    let mut processed: HashSet<String> = HashSet::new();

    let mut reader = make_reader(text, delimiter);
    let _ = reader.headers()?;
    for (i, record) in reader.records().enumerate() {
        let row_num = i + 2;
        let record = record?;

        let get = |idx: usize| record.get(idx).unwrap_or("").trim();
        let id = get(id_idx);
        let x_raw = get(x_idx);
        let y_raw = get(y_idx);

        if id.is_empty() || x_raw.is_empty() || y_raw.is_empty() {
            report.errors.push(format!("Row {row_num}: Missing required data"));
            continue;
        }

        // Conflicts and duplicates were reported in the first pass.
        if !valid_ids.contains(id) || processed.contains(id) {
            continue;
        }

        let (Ok(x), Ok(y)) = (x_raw.parse::<f64>(), y_raw.parse::<f64>()) else {
            report.errors.push(format!("Row {row_num}: Invalid coordinates"));
            continue;
        };

        let address = address_idx
            .map(|idx| get(idx))
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown Address ({id})"));

        let geom = match data::create_geometry(&txn, dataset.id, id, &address, x, y, Some(user_id))
            .await
        {
            Ok(g) => g,
            Err(data::DataError::Db(e)) => return Err(ImportError::Db(e)),
            Err(e) => {
                report.errors.push(format!("Row {row_num}: {e}"));
                continue;
            }
        };

        let entry = match data::create_entry(
            &txn,
            geom.id,
            Some(id.to_string()),
            None,
            Some(user_id),
            true,
        )
        .await
        {
            Ok(e) => e,
            Err(data::DataError::Db(e)) => return Err(ImportError::Db(e)),
            Err(e) => {
                report.errors.push(format!("Row {row_num}: {e}"));
                continue;
            }
        };

        // Every remaining column with a value becomes a dynamic field.
        for (idx, header) in headers.iter().enumerate() {
            if role_idx.contains(&idx) {
                continue;
            }
            let value = get(idx);
            if value.is_empty() {
                continue;
            }
            schema::get_or_create_field(&txn, dataset.id, header).await?;
            data::set_field_value(&txn, entry.id, header, FieldType::Text, Some(value)).await?;
        }

        processed.insert(id.to_string());
        report.imported += 1;
    }

    txn.commit().await?;

    tracing::info!(
        dataset = %dataset.id,
        imported = report.imported,
        errors = report.errors.len(),
        "CSV import finished"
    );
    Ok(report)
}
