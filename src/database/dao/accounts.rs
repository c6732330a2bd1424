use crate::database::entities::{AccountRecord, accounts};
use crate::database::{DatabaseError, DatabaseResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Accounts DAO for database operations
#[derive(Clone)]
pub struct AccountsDao {
    db: DatabaseConnection,
}

impl AccountsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new account, returning its assigned id
    pub async fn insert(&self, account: &AccountRecord) -> DatabaseResult<i32> {
        let active_model = accounts::ActiveModel {
            id: ActiveValue::NotSet, // Let database auto-assign ID
            external_id: Set(account.external_id.clone()),
            email: Set(account.email.clone()),
            created_at: Set(account.created_at),
            minutes_limit: Set(account.minutes_limit),
            assistant_limit: Set(account.assistant_limit),
            max_lifetime_days: Set(account.max_lifetime_days),
        };

        let inserted = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(inserted.id)
    }

    /// Find account by ID
    pub async fn find_by_id(&self, account_id: i32) -> DatabaseResult<Option<AccountRecord>> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(account)
    }

    /// Find account by the dashboard's tenant key
    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> DatabaseResult<Option<AccountRecord>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(account)
    }

    /// List every account id, oldest signup first. Used by the maintenance
    /// sweep to evaluate all tenants.
    pub async fn list_ids(&self) -> DatabaseResult<Vec<i32>> {
        let ids: Vec<i32> = accounts::Entity::find()
            .select_only()
            .column(accounts::Column::Id)
            .order_by_asc(accounts::Column::CreatedAt)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(ids)
    }

    /// Count all accounts
    pub async fn count(&self) -> DatabaseResult<u64> {
        let count = accounts::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(count)
    }
}
