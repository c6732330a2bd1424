use super::{Accounts, Assistants};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assistants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assistants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assistants::AccountId).integer().not_null())
                    .col(ColumnDef::new(Assistants::Name).string().not_null())
                    .col(
                        ColumnDef::new(Assistants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assistants::UsageMinutes)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Assistants::State)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assistants_account_id")
                            .from(Assistants::Table, Assistants::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Aggregation always scans by owning account
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assistants_account_id")
                    .table(Assistants::Table)
                    .col(Assistants::AccountId)
                    .to_owned(),
            )
            .await?;

        // Enforcement filters on (account, state)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assistants_account_state")
                    .table(Assistants::Table)
                    .col(Assistants::AccountId)
                    .col(Assistants::State)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assistants::Table).to_owned())
            .await
    }
}
