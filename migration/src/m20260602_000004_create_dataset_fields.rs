use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DatasetField::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DatasetField::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DatasetField::DatasetId).uuid().not_null())
                    .col(ColumnDef::new(DatasetField::FieldName).string().not_null())
                    .col(ColumnDef::new(DatasetField::Label).string().not_null())
                    .col(
                        ColumnDef::new(DatasetField::FieldType)
                            .string()
                            .not_null()
                            .default("text"),
                    )
                    .col(
                        ColumnDef::new(DatasetField::Required)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DatasetField::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(DatasetField::HelpText).text().null())
                    .col(ColumnDef::new(DatasetField::Choices).text().null())
                    .col(
                        ColumnDef::new(DatasetField::OrderIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DatasetField::IsCoordinateField)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DatasetField::IsIdField)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DatasetField::IsAddressField)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(DatasetField::TypologyId).uuid().null())
                    .col(
                        ColumnDef::new(DatasetField::TypologyCategory)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DatasetField::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DatasetField::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DatasetField::Table, DatasetField::DatasetId)
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DatasetField::Table, DatasetField::TypologyId)
                            .to(Typology::Table, Typology::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_dataset_field_name")
                    .table(DatasetField::Table)
                    .col(DatasetField::DatasetId)
                    .col(DatasetField::FieldName)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DatasetField::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Dataset {
    Table,
    Id,
}

#[derive(Iden)]
enum Typology {
    Table,
    Id,
}

#[derive(Iden)]
enum DatasetField {
    Table,
    Id,
    DatasetId,
    FieldName,
    Label,
    FieldType,
    Required,
    Enabled,
    HelpText,
    Choices,
    OrderIndex,
    IsCoordinateField,
    IsIdField,
    IsAddressField,
    TypologyId,
    TypologyCategory,
    CreatedAt,
    UpdatedAt,
}
