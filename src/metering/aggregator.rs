use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    database::DatabaseManager,
    database::entities::AssistantRecord,
    error::AppError,
};

/// Point-in-time aggregate of one account's consumption.
///
/// `total_minutes` counts every assistant the account ever ran, including
/// expired and deleted ones: the demo budget measures lifetime consumption,
/// and retiring a resource does not hand minutes back. `active_assistants`
/// counts only assistants still in the `active` state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsageSnapshot {
    pub account_id: i32,
    pub total_minutes: f64,
    pub active_assistants: u32,
}

impl UsageSnapshot {
    /// Fold a set of assistant rows into a snapshot. Pure; used by the
    /// enforcer to reuse a single read within one evaluation pass.
    pub fn from_assistants(account_id: i32, assistants: &[AssistantRecord]) -> Self {
        let total_minutes = assistants.iter().map(|a| a.usage_minutes).sum();
        let active_assistants = assistants.iter().filter(|a| a.state.is_active()).count() as u32;

        Self {
            account_id,
            total_minutes,
            active_assistants,
        }
    }
}

/// Computes usage snapshots from the assistant store. Read-only.
pub struct UsageAggregator {
    database: Arc<dyn DatabaseManager>,
}

impl UsageAggregator {
    pub fn new(database: Arc<dyn DatabaseManager>) -> Self {
        Self { database }
    }

    /// Produce a `UsageSnapshot` for the account, consistent with the store
    /// at call time. Fails with `NotFound` for unknown accounts.
    pub async fn compute_usage(&self, account_id: i32) -> Result<UsageSnapshot, AppError> {
        self.database
            .accounts()
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account {}", account_id)))?;

        let assistants = self.database.assistants().list_by_account(account_id).await?;

        Ok(UsageSnapshot::from_assistants(account_id, &assistants))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::{AssistantRecord, AssistantState};

    #[test]
    fn test_snapshot_counts_minutes_across_all_states() {
        let assistants = vec![
            AssistantRecord::new(1, "a").with_usage_minutes(2.0),
            AssistantRecord::new(1, "b")
                .with_usage_minutes(3.5)
                .with_state(AssistantState::Expired),
            AssistantRecord::new(1, "c")
                .with_usage_minutes(4.5)
                .with_state(AssistantState::Deleted),
        ];

        let snapshot = UsageSnapshot::from_assistants(1, &assistants);
        assert_eq!(snapshot.total_minutes, 10.0);
        assert_eq!(snapshot.active_assistants, 1);
    }

    #[test]
    fn test_snapshot_of_empty_account() {
        let snapshot = UsageSnapshot::from_assistants(1, &[]);
        assert_eq!(snapshot.total_minutes, 0.0);
        assert_eq!(snapshot.active_assistants, 0);
    }
}
