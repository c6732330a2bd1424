use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    config::LimitsConfig,
    database::DatabaseManager,
    database::entities::{AssistantState, assistants},
    error::AppError,
    metering::aggregator::UsageSnapshot,
    metering::classifier::{Classification, PlanLimits, Thresholds, WarningTier, classify},
};

/// Global enforcement policy; per-account limits come off the account row
#[derive(Debug, Clone, Copy)]
pub struct EnforcementPolicy {
    pub thresholds: Thresholds,
    pub duration_cap_seconds: u32,
}

impl From<&LimitsConfig> for EnforcementPolicy {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            thresholds: Thresholds::from(limits),
            duration_cap_seconds: limits.duration_cap_seconds,
        }
    }
}

/// Outcome of one evaluation pass over an account.
///
/// `assistants_to_expire` lists the assistants this pass transitioned to
/// `deleted`; concurrent passes over the same account partition the set
/// between them, so no assistant is ever reported twice. `failed_assistants`
/// lists rows whose state write failed and which the next pass will retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementDecision {
    pub account_id: i32,
    pub tier: WarningTier,
    pub remaining_minutes: f64,
    pub remaining_assistant_slots: i32,
    pub usage_limit_reached: bool,
    pub assistant_limit_reached: bool,
    pub any_limit_reached: bool,
    pub lifetime_expired: bool,
    pub assistants_to_expire: Vec<i32>,
    pub failed_assistants: Vec<i32>,
    pub duration_cap_seconds: Option<u32>,
}

/// Applies consequences once a limit is reached or an account's demo
/// lifetime has run out, and reports what changed.
pub struct LifecycleEnforcer {
    database: Arc<dyn DatabaseManager>,
    policy: EnforcementPolicy,
}

impl LifecycleEnforcer {
    pub fn new(database: Arc<dyn DatabaseManager>, policy: EnforcementPolicy) -> Self {
        Self { database, policy }
    }

    /// Run one evaluation pass: aggregate, classify, then either retire the
    /// account's assistants or hand back a call-duration cap.
    ///
    /// Safe to re-run: already-deleted assistants are skipped via the
    /// conditional state update, and a pass that has nothing left to delete
    /// reports the same classification with an empty delta.
    pub async fn enforce(&self, account_id: i32) -> Result<EnforcementDecision, AppError> {
        let account = self
            .database
            .accounts()
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account {}", account_id)))?;

        let assistant_rows = self.database.assistants().list_by_account(account_id).await?;
        let snapshot = UsageSnapshot::from_assistants(account_id, &assistant_rows);
        let limits = PlanLimits::from(&account);
        let classification = classify(&snapshot, &limits, &self.policy.thresholds)?;

        let lifetime_expired = account.lifetime_expired(Utc::now());
        let triggered = classification.any_limit_reached() || lifetime_expired;

        let (expired, failed) = if triggered {
            self.retire_assistants(&assistant_rows).await
        } else {
            (Vec::new(), Vec::new())
        };

        if triggered && !expired.is_empty() {
            info!(
                account_id,
                tier = ?classification.tier,
                lifetime_expired,
                expired = expired.len(),
                failed = failed.len(),
                "retired assistants for account over limit"
            );
        }

        Ok(self.decision(
            account_id,
            &classification,
            lifetime_expired,
            triggered,
            expired,
            failed,
        ))
    }

    /// Transition every not-yet-deleted assistant to `deleted`. Expiry and
    /// deletion are one step here; there is no grace window between them.
    /// A failed write is recorded and does not stop the rest of the batch.
    async fn retire_assistants(
        &self,
        assistant_rows: &[assistants::Model],
    ) -> (Vec<i32>, Vec<i32>) {
        let dao = self.database.assistants();
        let mut expired = Vec::new();
        let mut failed = Vec::new();

        for assistant in assistant_rows {
            if assistant.state.is_deleted() {
                continue;
            }

            match dao
                .transition_state(assistant.id, assistant.state, AssistantState::Deleted)
                .await
            {
                Ok(true) => expired.push(assistant.id),
                Ok(false) => {
                    // Lost the race to a concurrent pass; its decision reports this id
                    debug!(assistant_id = assistant.id, "assistant already retired");
                }
                Err(err) => {
                    warn!(
                        assistant_id = assistant.id,
                        error = %err,
                        "failed to retire assistant, will retry next pass"
                    );
                    failed.push(assistant.id);
                }
            }
        }

        (expired, failed)
    }

    fn decision(
        &self,
        account_id: i32,
        classification: &Classification,
        lifetime_expired: bool,
        triggered: bool,
        assistants_to_expire: Vec<i32>,
        failed_assistants: Vec<i32>,
    ) -> EnforcementDecision {
        // The cap only applies while calls are still allowed at all
        let duration_cap_seconds = if !triggered && classification.tier == WarningTier::Critical {
            Some(self.policy.duration_cap_seconds)
        } else {
            None
        };

        EnforcementDecision {
            account_id,
            tier: classification.tier,
            remaining_minutes: classification.remaining_minutes,
            remaining_assistant_slots: classification.remaining_assistant_slots,
            usage_limit_reached: classification.usage_limit_reached,
            assistant_limit_reached: classification.assistant_limit_reached,
            any_limit_reached: classification.any_limit_reached(),
            lifetime_expired,
            assistants_to_expire,
            failed_assistants,
            duration_cap_seconds,
        }
    }
}
