use super::Accounts;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::ExternalId).string().not_null())
                    .col(ColumnDef::new(Accounts::Email).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Accounts::MinutesLimit).double().not_null())
                    .col(
                        ColumnDef::new(Accounts::AssistantLimit)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::MaxLifetimeDays)
                            .integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Dashboard looks accounts up by their tenant key
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_accounts_external_id")
                    .table(Accounts::Table)
                    .col(Accounts::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}
