use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MappingArea::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MappingArea::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MappingArea::DatasetId).uuid().not_null())
                    .col(ColumnDef::new(MappingArea::Name).string().not_null())
                    // JSON text: closed exterior ring as [[lon, lat], ...]
                    .col(ColumnDef::new(MappingArea::Ring).text().not_null())
                    .col(ColumnDef::new(MappingArea::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(MappingArea::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MappingArea::Table, MappingArea::DatasetId)
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MappingArea::Table, MappingArea::CreatedBy)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MappingAreaUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MappingAreaUser::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MappingAreaUser::MappingAreaId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MappingAreaUser::UserId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(MappingAreaUser::Table, MappingAreaUser::MappingAreaId)
                            .to(MappingArea::Table, MappingArea::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MappingAreaUser::Table, MappingAreaUser::UserId)
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
                    .name("uq_mapping_area_user")
                    .table(MappingAreaUser::Table)
                    .col(MappingAreaUser::MappingAreaId)
                    .col(MappingAreaUser::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DatasetUserMappingArea::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DatasetUserMappingArea::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DatasetUserMappingArea::DatasetId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DatasetUserMappingArea::UserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DatasetUserMappingArea::MappingAreaId)
                            .uuid()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                DatasetUserMappingArea::Table,
                                DatasetUserMappingArea::DatasetId,
                            )
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                DatasetUserMappingArea::Table,
                                DatasetUserMappingArea::UserId,
                            )
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                DatasetUserMappingArea::Table,
                                DatasetUserMappingArea::MappingAreaId,
                            )
                            .to(MappingArea::Table, MappingArea::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_dataset_user_mapping_area")
                    .table(DatasetUserMappingArea::Table)
                    .col(DatasetUserMappingArea::DatasetId)
                    .col(DatasetUserMappingArea::UserId)
                    .col(DatasetUserMappingArea::MappingAreaId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DatasetGroupMappingArea::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DatasetGroupMappingArea::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DatasetGroupMappingArea::DatasetId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DatasetGroupMappingArea::GroupId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DatasetGroupMappingArea::MappingAreaId)
                            .uuid()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                DatasetGroupMappingArea::Table,
                                DatasetGroupMappingArea::DatasetId,
                            )
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                DatasetGroupMappingArea::Table,
                                DatasetGroupMappingArea::GroupId,
                            )
                            .to(UserGroup::Table, UserGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                DatasetGroupMappingArea::Table,
                                DatasetGroupMappingArea::MappingAreaId,
                            )
                            .to(MappingArea::Table, MappingArea::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_dataset_group_mapping_area")
                    .table(DatasetGroupMappingArea::Table)
                    .col(DatasetGroupMappingArea::DatasetId)
                    .col(DatasetGroupMappingArea::GroupId)
                    .col(DatasetGroupMappingArea::MappingAreaId)
                    .to_owned(),
            )
            .await?;

        // Opt-in flag on dataset: area limits are only enforced when enabled.
        manager
            .alter_table(
                Table::alter()
                    .table(Dataset::Table)
                    .add_column(
                        ColumnDef::new(Dataset::EnableMappingAreas)
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
                    .table(Dataset::Table)
                    .drop_column(Dataset::EnableMappingAreas)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(DatasetGroupMappingArea::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(DatasetUserMappingArea::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MappingAreaUser::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MappingArea::Table).to_owned())
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
    EnableMappingAreas,
}

#[derive(Iden)]
enum MappingArea {
    Table,
    Id,
    DatasetId,
    Name,
    Ring,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum MappingAreaUser {
    Table,
    Id,
    MappingAreaId,
    UserId,
}

#[derive(Iden)]
enum DatasetUserMappingArea {
    Table,
    Id,
    DatasetId,
    UserId,
    MappingAreaId,
}

#[derive(Iden)]
enum DatasetGroupMappingArea {
    Table,
    Id,
    DatasetId,
    GroupId,
    MappingAreaId,
}
