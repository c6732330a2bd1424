use sea_orm_migration::prelude::*;

pub use sea_orm_migration::MigratorTrait;

mod m20260105_000001_create_accounts_table;
mod m20260105_000002_create_assistants_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_create_accounts_table::Migration),
            Box::new(m20260105_000002_create_assistants_table::Migration),
        ]
    }
}

/// Common table and column identifiers
#[derive(Iden)]
pub enum Accounts {
    Table,
    Id,
    ExternalId,
    Email,
    CreatedAt,
    MinutesLimit,
    AssistantLimit,
    MaxLifetimeDays,
}

#[derive(Iden)]
pub enum Assistants {
    Table,
    Id,
    AccountId,
    Name,
    CreatedAt,
    UsageMinutes,
    State,
}
