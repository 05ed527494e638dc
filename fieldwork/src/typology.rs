//! Typology service: named, reusable (code, category, name) lookup
//! tables that dataset fields can bind to instead of manual choice lists.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::{dataset_field, typology, typology_entry};
use crate::import::delimiter::detect_delimiter;

#[derive(Debug)]
pub enum TypologyError {
    NotFound,
    /// (typology, code) already taken.
    DuplicateCode(i32),
    /// Still referenced by dataset fields.
    InUse(u64),
    Db(sea_orm::DbErr),
}

impl std::fmt::Display for TypologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypologyError::NotFound => write!(f, "Typology not found"),
            TypologyError::DuplicateCode(code) => {
                write!(f, "Code {code} already exists in this typology")
            }
            TypologyError::InUse(count) => {
                write!(f, "Typology is referenced by {count} dataset fields")
            }
            TypologyError::Db(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for TypologyError {}

impl From<sea_orm::DbErr> for TypologyError {
    fn from(e: sea_orm::DbErr) -> Self {
        TypologyError::Db(e)
    }
}

/// Outcome of a typology entry CSV import.
#[derive(Debug, Default)]
pub struct EntryImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

pub async fn create_typology(
    db: &impl ConnectionTrait,
    name: &str,
    owner_id: Option<Uuid>,
    is_public: bool,
) -> Result<typology::Model, sea_orm::DbErr> {
    typology::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(name.to_string()),
        owner_id: Set(owner_id),
        is_public: Set(is_public),
        created_at: Set(chrono::Utc::now().naive_utc()),
    }
    .insert(db)
    .await
}

/// Typologies a user may bind to fields: their own plus public ones.
pub async fn list_visible(
    db: &impl ConnectionTrait,
    user_id: Uuid,
) -> Result<Vec<typology::Model>, sea_orm::DbErr> {
    typology::Entity::find()
        .filter(
            Condition::any()
                .add(typology::Column::OwnerId.eq(user_id))
                .add(typology::Column::IsPublic.eq(true)),
        )
        .order_by_desc(typology::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn add_entry(
    db: &impl ConnectionTrait,
    typology_id: Uuid,
    code: i32,
    category: &str,
    name: &str,
) -> Result<typology_entry::Model, TypologyError> {
    typology_entry::ActiveModel {
        id: Set(Uuid::now_v7()),
        typology_id: Set(typology_id),
        code: Set(code),
        category: Set(category.to_string()),
        name: Set(name.to_string()),
    }
    .insert(db)
    .await
    .map_err(|e| {
        let msg = e.to_string();
        if msg.contains("UNIQUE") || msg.contains("unique") {
            TypologyError::DuplicateCode(code)
        } else {
            TypologyError::Db(e)
        }
    })
}

pub async fn list_entries(
    db: &impl ConnectionTrait,
    typology_id: Uuid,
) -> Result<Vec<typology_entry::Model>, sea_orm::DbErr> {
    typology_entry::Entity::find()
        .filter(typology_entry::Column::TypologyId.eq(typology_id))
        .order_by_asc(typology_entry::Column::Code)
        .all(db)
        .await
}

/// Delete a typology. Bound fields keep working — the FK is SET NULL, so
/// they fall back to their manual choice lists — but deleting a typology
/// that is still referenced requires `force` to avoid silently changing
/// rendered forms.
pub async fn delete_typology(
    db: &impl ConnectionTrait,
    typology_id: Uuid,
    force: bool,
) -> Result<(), TypologyError> {
    let references = dataset_field::Entity::find()
        .filter(dataset_field::Column::TypologyId.eq(typology_id))
        .count(db)
        .await?;
    if references > 0 && !force {
        return Err(TypologyError::InUse(references));
    }

    let result = typology::Entity::delete_by_id(typology_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(TypologyError::NotFound);
    }
    Ok(())
}

/// Import typology entries from CSV text with columns code, category,
/// name (header required, delimiter auto-detected). Row-scoped problems
/// accumulate; good rows still land.
pub async fn import_entries_csv(
    db: &impl ConnectionTrait,
    typology_id: Uuid,
    text: &str,
) -> Result<EntryImportReport, sea_orm::DbErr> {
    let delimiter = detect_delimiter(text, 1024);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().cloned().unwrap_or_default();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (code_idx, category_idx, name_idx) = match (col("code"), col("category"), col("name")) {
        (Some(c), Some(cat), Some(n)) => (c, cat, n),
        _ => {
            return Ok(EntryImportReport {
                imported: 0,
                errors: vec!["Header must contain code, category and name columns".to_string()],
            });
        }
    };

    let mut report = EntryImportReport::default();
    for (i, record) in reader.records().enumerate() {
        let row_num = i + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                report.errors.push(format!("Row {row_num}: {e}"));
                continue;
            }
        };

        let code_raw = record.get(code_idx).unwrap_or("").trim();
        let code = match code_raw.parse::<i32>() {
            Ok(c) => c,
            Err(_) => {
                report
                    .errors
                    .push(format!("Row {row_num}: Invalid code \"{code_raw}\""));
                continue;
            }
        };
        let category = record.get(category_idx).unwrap_or("").trim();
        let name = record.get(name_idx).unwrap_or("").trim();
        if name.is_empty() {
            report.errors.push(format!("Row {row_num}: Missing name"));
            continue;
        }

        match add_entry(db, typology_id, code, category, name).await {
            Ok(_) => report.imported += 1,
            Err(TypologyError::DuplicateCode(c)) => {
                report
                    .errors
                    .push(format!("Row {row_num}: Duplicate code {c}"));
            }
            Err(TypologyError::Db(e)) => return Err(e),
            Err(other) => {
                report.errors.push(format!("Row {row_num}: {other}"));
            }
        }
    }

    Ok(report)
}
