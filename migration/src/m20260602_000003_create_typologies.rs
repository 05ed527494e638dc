use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Typology::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Typology::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Typology::Name).string().not_null())
                    .col(ColumnDef::new(Typology::OwnerId).uuid().null())
                    .col(
                        ColumnDef::new(Typology::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Typology::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Typology::Table, Typology::OwnerId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TypologyEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TypologyEntry::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TypologyEntry::TypologyId).uuid().not_null())
                    .col(ColumnDef::new(TypologyEntry::Code).integer().not_null())
                    .col(ColumnDef::new(TypologyEntry::Category).string().not_null())
                    .col(ColumnDef::new(TypologyEntry::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(TypologyEntry::Table, TypologyEntry::TypologyId)
                            .to(Typology::Table, Typology::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_typology_entry_code")
                    .table(TypologyEntry::Table)
                    .col(TypologyEntry::TypologyId)
                    .col(TypologyEntry::Code)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TypologyEntry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Typology::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AppUser {
    Table,
    Id,
}

#[derive(Iden)]
enum Typology {
    Table,
    Id,
    Name,
    OwnerId,
    IsPublic,
    CreatedAt,
}

#[derive(Iden)]
enum TypologyEntry {
    Table,
    Id,
    TypologyId,
    Code,
    Category,
    Name,
}
