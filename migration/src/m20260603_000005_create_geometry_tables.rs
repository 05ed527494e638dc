use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // geometry
        manager
            .create_table(
                Table::create()
                    .table(Geometry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Geometry::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Geometry::DatasetId).uuid().not_null())
                    .col(ColumnDef::new(Geometry::IdKurz).string().not_null())
                    .col(ColumnDef::new(Geometry::Address).string().not_null())
                    .col(ColumnDef::new(Geometry::Lon).double().not_null())
                    .col(ColumnDef::new(Geometry::Lat).double().not_null())
                    .col(ColumnDef::new(Geometry::UserId).uuid().null())
                    .col(
                        ColumnDef::new(Geometry::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Geometry::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Geometry::Table, Geometry::DatasetId)
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Geometry::Table, Geometry::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_geometry_dataset_id_kurz")
                    .table(Geometry::Table)
                    .col(Geometry::DatasetId)
                    .col(Geometry::IdKurz)
                    .to_owned(),
            )
            .await?;

        // entry
        manager
            .create_table(
                Table::create()
                    .table(Entry::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Entry::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Entry::GeometryId).uuid().not_null())
                    .col(ColumnDef::new(Entry::Name).string().null())
                    .col(ColumnDef::new(Entry::Year).integer().null())
                    .col(ColumnDef::new(Entry::UserId).uuid().null())
                    .col(
                        ColumnDef::new(Entry::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Entry::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Entry::Table, Entry::GeometryId)
                            .to(Geometry::Table, Geometry::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Entry::Table, Entry::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // entry_field_value
        manager
            .create_table(
                Table::create()
                    .table(EntryFieldValue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EntryFieldValue::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EntryFieldValue::EntryId).uuid().not_null())
                    .col(
                        ColumnDef::new(EntryFieldValue::FieldName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EntryFieldValue::FieldType)
                            .string()
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(EntryFieldValue::Value).text().null())
                    .col(
                        ColumnDef::new(EntryFieldValue::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(EntryFieldValue::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EntryFieldValue::Table, EntryFieldValue::EntryId)
                            .to(Entry::Table, Entry::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_entry_field_value_name")
                    .table(EntryFieldValue::Table)
                    .col(EntryFieldValue::EntryId)
                    .col(EntryFieldValue::FieldName)
                    .to_owned(),
            )
            .await?;

        // entry_file
        manager
            .create_table(
                Table::create()
                    .table(EntryFile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EntryFile::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EntryFile::EntryId).uuid().not_null())
                    .col(ColumnDef::new(EntryFile::FilePath).string().not_null())
                    .col(ColumnDef::new(EntryFile::Filename).string().not_null())
                    .col(ColumnDef::new(EntryFile::FileType).string().not_null())
                    .col(ColumnDef::new(EntryFile::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(EntryFile::UploadUserId).uuid().null())
                    .col(ColumnDef::new(EntryFile::Description).text().null())
                    .col(
                        ColumnDef::new(EntryFile::UploadedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EntryFile::Table, EntryFile::EntryId)
                            .to(Entry::Table, Entry::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EntryFile::Table, EntryFile::UploadUserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EntryFile::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EntryFieldValue::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Geometry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AppUser {
    Table,
    Id,
}

#[derive(Iden)]
enum Dataset {
    Table,
    Id,
}

#[derive(Iden)]
enum Geometry {
    Table,
    Id,
    DatasetId,
    IdKurz,
    Address,
    Lon,
    Lat,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Entry {
    Table,
    Id,
    GeometryId,
    Name,
    Year,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum EntryFieldValue {
    Table,
    Id,
    EntryId,
    FieldName,
    FieldType,
    Value,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum EntryFile {
    Table,
    Id,
    EntryId,
    FilePath,
    Filename,
    FileType,
    FileSize,
    UploadUserId,
    Description,
    UploadedAt,
}
