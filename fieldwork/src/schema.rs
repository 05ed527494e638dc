//! Field schema resolution: the runtime-defined columns of a dataset.

use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::codec::FieldType;
use crate::entity::{dataset_field, typology_entry};

/// Error type for schema operations.
#[derive(Debug)]
pub enum SchemaError {
    /// (dataset, field_name) already taken.
    DuplicateFieldName(String),
    Db(sea_orm::DbErr),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::DuplicateFieldName(name) => {
                write!(f, "Field \"{name}\" already exists for this dataset")
            }
            SchemaError::Db(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<sea_orm::DbErr> for SchemaError {
    fn from(e: sea_orm::DbErr) -> Self {
        SchemaError::Db(e)
    }
}

/// One selectable option for a choice-rendered field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

/// Parameters for creating a field through the manual path.
#[derive(Debug, Clone, Default)]
pub struct NewField {
    pub field_name: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub enabled: bool,
    pub help_text: Option<String>,
    pub choices: Option<String>,
    pub order_index: i32,
    pub typology_id: Option<Uuid>,
    pub typology_category: Option<String>,
}

/// Normalize a label into an internal field name: lowercase, runs of
/// non-alphanumerics collapsed to single underscores, trimmed. Only the
/// manual field-creation path applies this; CSV import keeps column
/// names verbatim.
pub fn clean_field_name(label: &str) -> String {
    let re = Regex::new(r"[^a-z0-9]+").unwrap();
    re.replace_all(&label.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

/// List a dataset's fields ordered by (order_index, field_name).
pub async fn list_fields(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
    enabled_only: bool,
) -> Result<Vec<dataset_field::Model>, sea_orm::DbErr> {
    let mut query = dataset_field::Entity::find()
        .filter(dataset_field::Column::DatasetId.eq(dataset_id));
    if enabled_only {
        query = query.filter(dataset_field::Column::Enabled.eq(true));
    }
    query
        .order_by_asc(dataset_field::Column::OrderIndex)
        .order_by_asc(dataset_field::Column::FieldName)
        .all(db)
        .await
}

/// Recovery operation: when a dataset has fields but none of them are
/// enabled, enable all of them so the data-input form is not empty.
/// Idempotent; meant to be invoked explicitly (not as a read side
/// effect). A dataset with no fields at all is left alone — fields come
/// from the editor or from import, never from a fabricated default.
pub async fn enable_all_fields_if_none_enabled(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
) -> Result<u64, sea_orm::DbErr> {
    use sea_orm::sea_query::Expr;

    let enabled = dataset_field::Entity::find()
        .filter(dataset_field::Column::DatasetId.eq(dataset_id))
        .filter(dataset_field::Column::Enabled.eq(true))
        .all(db)
        .await?;
    if !enabled.is_empty() {
        return Ok(0);
    }

    let result = dataset_field::Entity::update_many()
        .col_expr(dataset_field::Column::Enabled, Expr::value(true))
        .filter(dataset_field::Column::DatasetId.eq(dataset_id))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        tracing::info!(
            dataset = %dataset_id,
            count = result.rows_affected,
            "re-enabled all fields (none were enabled)"
        );
    }
    Ok(result.rows_affected)
}

/// Create a field, surfacing the (dataset, field_name) uniqueness
/// violation as a domain error.
pub async fn create_field(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
    spec: NewField,
) -> Result<dataset_field::Model, SchemaError> {
    let now = chrono::Utc::now().naive_utc();
    dataset_field::ActiveModel {
        id: Set(Uuid::now_v7()),
        dataset_id: Set(dataset_id),
        field_name: Set(spec.field_name.clone()),
        label: Set(spec.label),
        field_type: Set(spec.field_type.as_str().to_string()),
        required: Set(spec.required),
        enabled: Set(spec.enabled),
        non_editable: Set(false),
        help_text: Set(spec.help_text),
        choices: Set(spec.choices),
        order_index: Set(spec.order_index),
        is_coordinate_field: Set(false),
        is_id_field: Set(false),
        is_address_field: Set(false),
        typology_id: Set(spec.typology_id),
        typology_category: Set(spec.typology_category),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| {
        let msg = e.to_string();
        if msg.contains("UNIQUE") || msg.contains("unique") {
            SchemaError::DuplicateFieldName(spec.field_name)
        } else {
            SchemaError::Db(e)
        }
    })
}

/// Get-or-create used by CSV import: every non-role column must have a
/// schema row. Import columns default to enabled text fields labelled
/// with the column name as-is.
pub async fn get_or_create_field(
    db: &impl ConnectionTrait,
    dataset_id: Uuid,
    field_name: &str,
) -> Result<dataset_field::Model, sea_orm::DbErr> {
    let existing = dataset_field::Entity::find()
        .filter(dataset_field::Column::DatasetId.eq(dataset_id))
        .filter(dataset_field::Column::FieldName.eq(field_name))
        .one(db)
        .await?;
    if let Some(field) = existing {
        return Ok(field);
    }

    let now = chrono::Utc::now().naive_utc();
    dataset_field::ActiveModel {
        id: Set(Uuid::now_v7()),
        dataset_id: Set(dataset_id),
        field_name: Set(field_name.to_string()),
        label: Set(field_name.to_string()),
        field_type: Set(FieldType::Text.as_str().to_string()),
        required: Set(false),
        enabled: Set(true),
        non_editable: Set(false),
        help_text: Set(None),
        choices: Set(None),
        order_index: Set(0),
        is_coordinate_field: Set(false),
        is_id_field: Set(false),
        is_address_field: Set(false),
        typology_id: Set(None),
        typology_category: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

/// Resolve the effective choice list for a field.
///
/// A bound typology wins over the manual `choices` string regardless of
/// the declared field type; its entries are filtered to
/// `typology_category` when set and ordered by code, each rendered as
/// `{value: "<code>", label: "<code> - <name>"}`. Without a typology,
/// choice-typed fields split the manual list on commas. Everything else
/// gets no choices.
pub async fn effective_choices(
    db: &impl ConnectionTrait,
    field: &dataset_field::Model,
) -> Result<Vec<ChoiceOption>, sea_orm::DbErr> {
    if let Some(typology_id) = field.typology_id {
        let mut query = typology_entry::Entity::find()
            .filter(typology_entry::Column::TypologyId.eq(typology_id));
        if let Some(ref category) = field.typology_category
            && !category.is_empty()
        {
            query = query.filter(typology_entry::Column::Category.eq(category.clone()));
        }
        let entries = query
            .order_by_asc(typology_entry::Column::Code)
            .all(db)
            .await?;
        return Ok(entries
            .into_iter()
            .map(|e| ChoiceOption {
                value: e.code.to_string(),
                label: format!("{} - {}", e.code, e.name),
            })
            .collect());
    }

    if FieldType::parse(&field.field_type) == FieldType::Choice
        && let Some(ref choices) = field.choices
    {
        return Ok(choices
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| ChoiceOption {
                value: c.to_string(),
                label: c.to_string(),
            })
            .collect());
    }

    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{app_user, dataset, typology};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};

    async fn setup() -> (DatabaseConnection, Uuid) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let now = chrono::Utc::now().naive_utc();
        let owner_id = Uuid::now_v7();
        app_user::ActiveModel {
            id: Set(owner_id),
            username: Set("owner".to_string()),
            password_hash: Set("hash".to_string()),
            is_superuser: Set(false),
            is_active: Set(true),
            email: Set(None),
            display_name: Set(None),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        let dataset_id = Uuid::now_v7();
        dataset::ActiveModel {
            id: Set(dataset_id),
            name: Set("Survey".to_string()),
            description: Set(None),
            owner_id: Set(owner_id),
            is_public: Set(false),
            allow_multiple_entries: Set(false),
            enable_mapping_areas: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        (db, dataset_id)
    }

    async fn insert_typology(db: &DatabaseConnection, entries: &[(i32, &str, &str)]) -> Uuid {
        let typology_id = Uuid::now_v7();
        typology::ActiveModel {
            id: Set(typology_id),
            name: Set("Usage codes".to_string()),
            owner_id: Set(None),
            is_public: Set(true),
            created_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(db)
        .await
        .unwrap();

        for (code, category, name) in entries {
            typology_entry::ActiveModel {
                id: Set(Uuid::now_v7()),
                typology_id: Set(typology_id),
                code: Set(*code),
                category: Set(category.to_string()),
                name: Set(name.to_string()),
            }
            .insert(db)
            .await
            .unwrap();
        }
        typology_id
    }

    // --- clean_field_name ---

    #[test]
    fn test_clean_field_name() {
        assert_eq!(clean_field_name("Usage Code 1"), "usage_code_1");
        assert_eq!(clean_field_name("  GEB_X  "), "geb_x");
        assert_eq!(clean_field_name("Größe (m²)"), "gr_e_m");
        assert_eq!(clean_field_name("year"), "year");
    }

    // --- uniqueness ---

    #[tokio::test]
    async fn test_duplicate_field_name_rejected() {
        let (db, dataset_id) = setup().await;
        let spec = NewField {
            field_name: "usage".to_string(),
            label: "Usage".to_string(),
            enabled: true,
            ..Default::default()
        };
        create_field(&db, dataset_id, spec.clone()).await.unwrap();

        let err = create_field(&db, dataset_id, spec).await.unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateFieldName(ref n) if n == "usage"));
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (db, dataset_id) = setup().await;
        let first = get_or_create_field(&db, dataset_id, "2016_NUTZUNG").await.unwrap();
        let second = get_or_create_field(&db, dataset_id, "2016_NUTZUNG").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.field_type, "text");
        assert!(first.enabled);
        assert_eq!(first.label, "2016_NUTZUNG");
    }

    // --- ordering ---

    #[tokio::test]
    async fn test_fields_ordered_by_order_then_name() {
        let (db, dataset_id) = setup().await;
        for (name, order) in [("b_field", 1), ("a_field", 1), ("z_field", 0)] {
            create_field(
                &db,
                dataset_id,
                NewField {
                    field_name: name.to_string(),
                    label: name.to_string(),
                    enabled: true,
                    order_index: order,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let fields = list_fields(&db, dataset_id, false).await.unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["z_field", "a_field", "b_field"]);
    }

    // --- repair operation ---

    #[tokio::test]
    async fn test_enable_all_when_none_enabled() {
        let (db, dataset_id) = setup().await;
        for name in ["one", "two"] {
            create_field(
                &db,
                dataset_id,
                NewField {
                    field_name: name.to_string(),
                    label: name.to_string(),
                    enabled: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let enabled = enable_all_fields_if_none_enabled(&db, dataset_id).await.unwrap();
        assert_eq!(enabled, 2);
        assert_eq!(list_fields(&db, dataset_id, true).await.unwrap().len(), 2);

        // Idempotent: second call is a no-op
        let again = enable_all_fields_if_none_enabled(&db, dataset_id).await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_repair_noop_when_some_enabled_or_no_fields() {
        let (db, dataset_id) = setup().await;
        assert_eq!(enable_all_fields_if_none_enabled(&db, dataset_id).await.unwrap(), 0);

        create_field(
            &db,
            dataset_id,
            NewField {
                field_name: "on".to_string(),
                label: "On".to_string(),
                enabled: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        create_field(
            &db,
            dataset_id,
            NewField {
                field_name: "off".to_string(),
                label: "Off".to_string(),
                enabled: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(enable_all_fields_if_none_enabled(&db, dataset_id).await.unwrap(), 0);
        assert_eq!(list_fields(&db, dataset_id, true).await.unwrap().len(), 1);
    }

    // --- effective choices ---

    #[tokio::test]
    async fn test_manual_choices_for_choice_field() {
        let (db, dataset_id) = setup().await;
        let field = create_field(
            &db,
            dataset_id,
            NewField {
                field_name: "status".to_string(),
                label: "Status".to_string(),
                field_type: FieldType::Choice,
                enabled: true,
                choices: Some("open, closed , , pending".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let choices = effective_choices(&db, &field).await.unwrap();
        let values: Vec<&str> = choices.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["open", "closed", "pending"]);
    }

    #[tokio::test]
    async fn test_typology_overrides_manual_choices() {
        let (db, dataset_id) = setup().await;
        let typology_id =
            insert_typology(&db, &[(640, "retail", "Shop"), (870, "retail", "Vacant")]).await;

        // Declared type is text and a manual list is set — the typology
        // still wins.
        let field = create_field(
            &db,
            dataset_id,
            NewField {
                field_name: "usage".to_string(),
                label: "Usage".to_string(),
                field_type: FieldType::Text,
                enabled: true,
                choices: Some("a,b".to_string()),
                typology_id: Some(typology_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let choices = effective_choices(&db, &field).await.unwrap();
        assert_eq!(
            choices,
            vec![
                ChoiceOption {
                    value: "640".to_string(),
                    label: "640 - Shop".to_string()
                },
                ChoiceOption {
                    value: "870".to_string(),
                    label: "870 - Vacant".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_typology_category_filter() {
        let (db, dataset_id) = setup().await;
        let typology_id = insert_typology(
            &db,
            &[(1, "innovation", "Low"), (2, "value", "Mid"), (3, "innovation", "High")],
        )
        .await;

        let field = create_field(
            &db,
            dataset_id,
            NewField {
                field_name: "cat_inno".to_string(),
                label: "Innovation".to_string(),
                field_type: FieldType::Choice,
                enabled: true,
                typology_id: Some(typology_id),
                typology_category: Some("innovation".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let choices = effective_choices(&db, &field).await.unwrap();
        let values: Vec<&str> = choices.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_non_choice_field_without_typology_has_no_choices() {
        let (db, dataset_id) = setup().await;
        let field = create_field(
            &db,
            dataset_id,
            NewField {
                field_name: "notes".to_string(),
                label: "Notes".to_string(),
                field_type: FieldType::Textarea,
                enabled: true,
                choices: Some("ignored,list".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(effective_choices(&db, &field).await.unwrap().is_empty());
    }
}
