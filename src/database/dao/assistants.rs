use crate::database::entities::{AssistantRecord, AssistantState, assistants};
use crate::database::{DatabaseError, DatabaseResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, sea_query::Expr,
};

/// Assistants DAO for database operations
#[derive(Clone)]
pub struct AssistantsDao {
    db: DatabaseConnection,
}

impl AssistantsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new assistant, returning its assigned id
    pub async fn insert(&self, assistant: &AssistantRecord) -> DatabaseResult<i32> {
        let active_model = assistants::ActiveModel {
            id: ActiveValue::NotSet, // Let database auto-assign ID
            account_id: Set(assistant.account_id),
            name: Set(assistant.name.clone()),
            created_at: Set(assistant.created_at),
            usage_minutes: Set(assistant.usage_minutes),
            state: Set(assistant.state),
        };

        let inserted = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(inserted.id)
    }

    /// Find assistant by ID
    pub async fn find_by_id(&self, assistant_id: i32) -> DatabaseResult<Option<AssistantRecord>> {
        let assistant = assistants::Entity::find_by_id(assistant_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(assistant)
    }

    /// List every assistant owned by an account, regardless of state
    pub async fn list_by_account(&self, account_id: i32) -> DatabaseResult<Vec<AssistantRecord>> {
        let assistants = assistants::Entity::find()
            .filter(assistants::Column::AccountId.eq(account_id))
            .order_by_asc(assistants::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(assistants)
    }

    /// Count an account's assistants in a given state
    pub async fn count_by_state(
        &self,
        account_id: i32,
        state: AssistantState,
    ) -> DatabaseResult<u64> {
        let count = assistants::Entity::find()
            .filter(assistants::Column::AccountId.eq(account_id))
            .filter(assistants::Column::State.eq(state))
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Add consumed minutes to an assistant (call-completion ingest).
    /// The increment happens in the database so concurrent webhooks do not
    /// lose updates. Negative increments are a caller bug and rejected.
    pub async fn add_usage_minutes(&self, assistant_id: i32, minutes: f64) -> DatabaseResult<()> {
        if minutes < 0.0 || minutes.is_nan() {
            return Err(DatabaseError::Constraint(format!(
                "usage increment must be non-negative, got {}",
                minutes
            )));
        }

        let result = assistants::Entity::update_many()
            .col_expr(
                assistants::Column::UsageMinutes,
                Expr::col(assistants::Column::UsageMinutes).add(minutes),
            )
            .filter(assistants::Column::Id.eq(assistant_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }

    /// Conditionally transition an assistant's state.
    ///
    /// The write only lands if the row still holds `expected`, so two
    /// concurrent enforcers racing on the same assistant observe exactly one
    /// winner. Returns `true` when this call performed the transition and
    /// `false` when the row was already past `expected`.
    pub async fn transition_state(
        &self,
        assistant_id: i32,
        expected: AssistantState,
        new_state: AssistantState,
    ) -> DatabaseResult<bool> {
        if !expected.can_transition_to(new_state) {
            return Err(DatabaseError::Constraint(format!(
                "illegal assistant state transition {} -> {}",
                expected.as_str(),
                new_state.as_str()
            )));
        }

        let result = assistants::Entity::update_many()
            .col_expr(assistants::Column::State, Expr::value(new_state.as_str()))
            .filter(assistants::Column::Id.eq(assistant_id))
            .filter(assistants::Column::State.eq(expected))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::AccountRecord;
    use crate::database::migration::{Migrator, MigratorTrait};
    use crate::{config::LimitsConfig, database::dao::AccountsDao};

    async fn setup() -> (AccountsDao, AssistantsDao, i32) {
        let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1);
        let db = sea_orm::Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let accounts = AccountsDao::new(db.clone());
        let assistants = AssistantsDao::new(db);

        let account = AccountRecord::demo("tenant-dao", "dao@example.com", &LimitsConfig::default());
        let account_id = accounts.insert(&account).await.unwrap();
        (accounts, assistants, account_id)
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let (_accounts, assistants, account_id) = setup().await;

        assistants
            .insert(&AssistantRecord::new(account_id, "front-desk"))
            .await
            .unwrap();
        assistants
            .insert(&AssistantRecord::new(account_id, "after-hours").with_usage_minutes(2.5))
            .await
            .unwrap();

        let listed = assistants.list_by_account(account_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].usage_minutes, 2.5);

        let active = assistants
            .count_by_state(account_id, AssistantState::Active)
            .await
            .unwrap();
        assert_eq!(active, 2);
    }

    #[tokio::test]
    async fn test_add_usage_minutes_accumulates() {
        let (_accounts, assistants, account_id) = setup().await;
        let id = assistants
            .insert(&AssistantRecord::new(account_id, "front-desk"))
            .await
            .unwrap();

        assistants.add_usage_minutes(id, 1.5).await.unwrap();
        assistants.add_usage_minutes(id, 0.5).await.unwrap();

        let assistant = assistants.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(assistant.usage_minutes, 2.0);
    }

    #[tokio::test]
    async fn test_add_usage_minutes_rejects_negative_and_unknown() {
        let (_accounts, assistants, account_id) = setup().await;
        let id = assistants
            .insert(&AssistantRecord::new(account_id, "front-desk"))
            .await
            .unwrap();

        let err = assistants.add_usage_minutes(id, -1.0).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));

        let err = assistants.add_usage_minutes(9999, 1.0).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound));
    }

    #[tokio::test]
    async fn test_transition_state_is_compare_and_swap() {
        let (_accounts, assistants, account_id) = setup().await;
        let id = assistants
            .insert(&AssistantRecord::new(account_id, "front-desk"))
            .await
            .unwrap();

        // First transition wins
        let won = assistants
            .transition_state(id, AssistantState::Active, AssistantState::Deleted)
            .await
            .unwrap();
        assert!(won);

        // Replaying the same transition observes the row already moved on
        let won = assistants
            .transition_state(id, AssistantState::Active, AssistantState::Deleted)
            .await
            .unwrap();
        assert!(!won);

        let assistant = assistants.find_by_id(id).await.unwrap().unwrap();
        assert!(assistant.state.is_deleted());
    }

    #[tokio::test]
    async fn test_transition_state_rejects_backward_moves() {
        let (_accounts, assistants, account_id) = setup().await;
        let id = assistants
            .insert(&AssistantRecord::new(account_id, "front-desk").with_state(AssistantState::Deleted))
            .await
            .unwrap();

        let err = assistants
            .transition_state(id, AssistantState::Deleted, AssistantState::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));
    }
}
