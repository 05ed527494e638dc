pub use sea_orm_migration::prelude::*;

mod m20260601_000001_create_users_and_groups;
mod m20260601_000002_create_datasets;
mod m20260602_000003_create_typologies;
mod m20260602_000004_create_dataset_fields;
mod m20260603_000005_create_geometry_tables;
mod m20260610_000006_create_mapping_areas;
mod m20260620_000007_create_export_tasks;
mod m20260715_000008_add_field_non_editable;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000001_create_users_and_groups::Migration),
            Box::new(m20260601_000002_create_datasets::Migration),
            Box::new(m20260602_000003_create_typologies::Migration),
            Box::new(m20260602_000004_create_dataset_fields::Migration),
            Box::new(m20260603_000005_create_geometry_tables::Migration),
            Box::new(m20260610_000006_create_mapping_areas::Migration),
            Box::new(m20260620_000007_create_export_tasks::Migration),
            Box::new(m20260715_000008_add_field_non_editable::Migration),
        ]
    }
}
