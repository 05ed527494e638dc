use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(DatasetField::Table)
                    .add_column(
                        ColumnDef::new(DatasetField::NonEditable)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(DatasetField::Table)
                    .drop_column(DatasetField::NonEditable)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum DatasetField {
    Table,
    NonEditable,
}
