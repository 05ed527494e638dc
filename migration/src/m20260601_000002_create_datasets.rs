use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dataset::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dataset::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dataset::Name).string().not_null())
                    .col(ColumnDef::new(Dataset::Description).text().null())
                    .col(ColumnDef::new(Dataset::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Dataset::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Dataset::AllowMultipleEntries)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Dataset::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Dataset::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Dataset::Table, Dataset::OwnerId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DatasetSharedUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DatasetSharedUser::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DatasetSharedUser::DatasetId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DatasetSharedUser::UserId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(DatasetSharedUser::Table, DatasetSharedUser::DatasetId)
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DatasetSharedUser::Table, DatasetSharedUser::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_dataset_shared_user")
                    .table(DatasetSharedUser::Table)
                    .col(DatasetSharedUser::DatasetId)
                    .col(DatasetSharedUser::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DatasetSharedGroup::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DatasetSharedGroup::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DatasetSharedGroup::DatasetId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DatasetSharedGroup::GroupId)
                            .uuid()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DatasetSharedGroup::Table, DatasetSharedGroup::DatasetId)
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DatasetSharedGroup::Table, DatasetSharedGroup::GroupId)
                            .to(UserGroup::Table, UserGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_dataset_shared_group")
                    .table(DatasetSharedGroup::Table)
                    .col(DatasetSharedGroup::DatasetId)
                    .col(DatasetSharedGroup::GroupId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DatasetSharedGroup::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DatasetSharedUser::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dataset::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AppUser {
    Table,
    Id,
}

#[derive(Iden)]
enum UserGroup {
    Table,
    Id,
}

#[derive(Iden)]
enum Dataset {
    Table,
    Id,
    Name,
    Description,
    OwnerId,
    IsPublic,
    AllowMultipleEntries,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum DatasetSharedUser {
    Table,
    Id,
    DatasetId,
    UserId,
}

#[derive(Iden)]
enum DatasetSharedGroup {
    Table,
    Id,
    DatasetId,
    GroupId,
}
