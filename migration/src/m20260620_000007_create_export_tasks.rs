use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExportTask::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExportTask::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExportTask::DatasetId).uuid().not_null())
                    .col(ColumnDef::new(ExportTask::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ExportTask::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    // JSON text: list of file type classes, e.g. ["image", "document"]
                    .col(ColumnDef::new(ExportTask::FileTypes).text().not_null())
                    .col(ColumnDef::new(ExportTask::DateFrom).date().null())
                    .col(ColumnDef::new(ExportTask::DateTo).date().null())
                    .col(
                        ColumnDef::new(ExportTask::OrganizeBy)
                            .string()
                            .not_null()
                            .default("geometry"),
                    )
                    .col(
                        ColumnDef::new(ExportTask::IncludeMetadata)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(ExportTask::FilePath).string().null())
                    .col(ColumnDef::new(ExportTask::FileSize).big_integer().null())
                    .col(ColumnDef::new(ExportTask::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(ExportTask::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ExportTask::CompletedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExportTask::Table, ExportTask::DatasetId)
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExportTask::Table, ExportTask::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExportTask::Table).to_owned())
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
enum ExportTask {
    Table,
    Id,
    DatasetId,
    UserId,
    Status,
    FileTypes,
    DateFrom,
    DateTo,
    OrganizeBy,
    IncludeMetadata,
    FilePath,
    FileSize,
    ErrorMessage,
    CreatedAt,
    CompletedAt,
}
