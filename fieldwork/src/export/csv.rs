//! CSV export: flattens geometries, entries and dynamic field values
//! back into tabular form.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::entity::{app_user, dataset, entry, entry_field_value, geometry};

/// Fixed leading columns; dynamic field names follow, sorted.
const FIXED_HEADER: &[&str] = &["ID", "Address", "X", "Y", "User", "Entry_Name", "Year"];

/// Render a dataset as CSV text: one row per (geometry, entry) pair.
///
/// The trailing column set is discovered from the values actually
/// present under the dataset, not from the field schema — an entry
/// missing a value for a discovered field yields a blank cell.
pub async fn export_dataset_csv(
    db: &impl ConnectionTrait,
    dataset: &dataset::Model,
) -> Result<String, sea_orm::DbErr> {
    let geometries = geometry::Entity::find()
        .filter(geometry::Column::DatasetId.eq(dataset.id))
        .order_by_asc(geometry::Column::IdKurz)
        .all(db)
        .await?;

    let geometry_ids: Vec<Uuid> = geometries.iter().map(|g| g.id).collect();
    let entries = entry::Entity::find()
        .filter(entry::Column::GeometryId.is_in(geometry_ids))
        .order_by_asc(entry::Column::CreatedAt)
        .all(db)
        .await?;

    let entry_ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
    let values = entry_field_value::Entity::find()
        .filter(entry_field_value::Column::EntryId.is_in(entry_ids))
        .all(db)
        .await?;

    // The column set is empirical: the union of every field_name seen.
    let field_names: BTreeSet<String> =
        values.iter().map(|v| v.field_name.clone()).collect();

    let mut values_by_entry: HashMap<Uuid, HashMap<String, String>> = HashMap::new();
    for value in values {
        values_by_entry
            .entry(value.entry_id)
            .or_default()
            .insert(value.field_name, value.value.unwrap_or_default());
    }

    let mut entries_by_geometry: HashMap<Uuid, Vec<&entry::Model>> = HashMap::new();
    for e in &entries {
        entries_by_geometry.entry(e.geometry_id).or_default().push(e);
    }

    let usernames = usernames_by_id(db, &geometries).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<String> = FIXED_HEADER.iter().map(|s| s.to_string()).collect();
    header.extend(field_names.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?;

    for geom in &geometries {
        let Some(geom_entries) = entries_by_geometry.get(&geom.id) else {
            continue;
        };
        let username = geom
            .user_id
            .and_then(|id| usernames.get(&id).cloned())
            .unwrap_or_else(|| "Unknown".to_string());

        for e in geom_entries {
            let mut row: Vec<String> = vec![
                geom.id_kurz.clone(),
                geom.address.clone(),
                geom.lon.to_string(),
                geom.lat.to_string(),
                username.clone(),
                e.name.clone().unwrap_or_default(),
                e.year.map(|y| y.to_string()).unwrap_or_default(),
            ];
            let entry_values = values_by_entry.get(&e.id);
            for field_name in &field_names {
                row.push(
                    entry_values
                        .and_then(|m| m.get(field_name).cloned())
                        .unwrap_or_default(),
                );
            }
            writer
                .write_record(&row)
                .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| sea_orm::DbErr::Custom(e.to_string()))
}

async fn usernames_by_id(
    db: &impl ConnectionTrait,
    geometries: &[geometry::Model],
) -> Result<HashMap<Uuid, String>, sea_orm::DbErr> {
    let user_ids: Vec<Uuid> = geometries.iter().filter_map(|g| g.user_id).collect();
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(app_user::Entity::find()
        .filter(app_user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldType;
    use crate::data;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

    async fn setup() -> (DatabaseConnection, dataset::Model, Uuid) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let now = chrono::Utc::now().naive_utc();
        let user_id = Uuid::now_v7();
        app_user::ActiveModel {
            id: Set(user_id),
            username: Set("surveyor".to_string()),
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

        let ds = dataset::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set("Survey".to_string()),
            description: Set(None),
            owner_id: Set(user_id),
            is_public: Set(false),
            allow_multiple_entries: Set(true),
            enable_mapping_areas: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        (db, ds, user_id)
    }

    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_header_and_row_per_entry() {
        let (db, ds, user_id) = setup().await;
        let geom = data::create_geometry(&db, ds.id, "A1", "Main St 1", 16.37, 48.21, Some(user_id))
            .await
            .unwrap();
        let e1 = data::create_entry(&db, geom.id, Some("2016".to_string()), Some(2016), None, true)
            .await
            .unwrap();
        let e2 = data::create_entry(&db, geom.id, Some("2022".to_string()), Some(2022), None, true)
            .await
            .unwrap();

        data::set_field_value(&db, e1.id, "nutzung", FieldType::Text, Some("640"))
            .await
            .unwrap();
        data::set_field_value(&db, e2.id, "nutzung", FieldType::Text, Some("870"))
            .await
            .unwrap();
        // Only the first entry carries this field
        data::set_field_value(&db, e1.id, "cat_inno", FieldType::Text, Some("999"))
            .await
            .unwrap();

        let out = export_dataset_csv(&db, &ds).await.unwrap();
        let rows = parse_csv(&out);

        assert_eq!(
            rows[0],
            vec!["ID", "Address", "X", "Y", "User", "Entry_Name", "Year", "cat_inno", "nutzung"]
        );
        // A geometry with 2 entries appears as exactly 2 rows.
        assert_eq!(rows.len(), 3);

        let row_2016 = rows.iter().find(|r| r[5] == "2016").unwrap();
        let row_2022 = rows.iter().find(|r| r[5] == "2022").unwrap();
        assert_eq!(row_2016[0], "A1");
        assert_eq!(row_2016[4], "surveyor");
        assert_eq!(row_2016[7], "999");
        assert_eq!(row_2016[8], "640");
        // Field present on only one entry: blank cell on the other row.
        assert_eq!(row_2022[7], "");
        assert_eq!(row_2022[8], "870");
    }

    #[tokio::test]
    async fn test_geometry_without_entries_is_omitted() {
        let (db, ds, user_id) = setup().await;
        data::create_geometry(&db, ds.id, "LONE", "Nowhere", 0.0, 0.0, Some(user_id))
            .await
            .unwrap();

        let out = export_dataset_csv(&db, &ds).await.unwrap();
        let rows = parse_csv(&out);
        assert_eq!(rows.len(), 1, "header only");
    }

    #[tokio::test]
    async fn test_unknown_user_placeholder() {
        let (db, ds, _user_id) = setup().await;
        let geom = data::create_geometry(&db, ds.id, "A1", "Addr", 1.0, 2.0, None)
            .await
            .unwrap();
        data::create_entry(&db, geom.id, Some("x".to_string()), None, None, true)
            .await
            .unwrap();

        let out = export_dataset_csv(&db, &ds).await.unwrap();
        let rows = parse_csv(&out);
        assert_eq!(rows[1][4], "Unknown");
    }

    #[tokio::test]
    async fn test_empty_dataset_exports_fixed_header() {
        let (db, ds, _user_id) = setup().await;
        let out = export_dataset_csv(&db, &ds).await.unwrap();
        let rows = parse_csv(&out);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            vec!["ID", "Address", "X", "Y", "User", "Entry_Name", "Year"]
        );
    }
}
