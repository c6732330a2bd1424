//! Usage metering and demo-account lifecycle enforcement.
//!
//! Three cooperating pieces: the aggregator folds assistant rows into a
//! `UsageSnapshot`, the classifier maps a snapshot onto a `WarningTier` and
//! remaining-capacity figures, and the enforcer applies consequences once a
//! limit or the demo lifetime is crossed. `MeteringService` wires them up
//! around an injected `DatabaseManager`; there is no shared mutable state.

pub mod aggregator;
pub mod classifier;
pub mod enforcer;

pub use aggregator::{UsageAggregator, UsageSnapshot};
pub use classifier::{Classification, PlanLimits, Thresholds, WarningTier, classify};
pub use enforcer::{EnforcementDecision, EnforcementPolicy, LifecycleEnforcer};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{config::LimitsConfig, database::DatabaseManager, error::AppError};

/// Account usage status as consumed by the dashboard's banners and progress
/// bars. Field names follow the frontend's casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountUsageStatus {
    pub account_id: i32,
    pub total_minutes: f64,
    pub minutes_limit: f64,
    pub remaining_minutes: f64,
    /// Consumed share of the minutes budget, clamped to 0..=100
    pub usage_percentage: f64,
    pub active_assistants: u32,
    pub max_assistants: i32,
    pub remaining_assistant_slots: i32,
    pub usage_limit_reached: bool,
    pub assistant_limit_reached: bool,
    pub any_limit_reached: bool,
    pub warning_level: WarningTier,
    pub duration_cap_seconds: Option<u32>,
}

/// Facade over the metering pipeline, one instance per process, constructed
/// with its storage dependency injected.
pub struct MeteringService {
    database: Arc<dyn DatabaseManager>,
    aggregator: UsageAggregator,
    enforcer: LifecycleEnforcer,
    policy: EnforcementPolicy,
}

impl MeteringService {
    pub fn new(database: Arc<dyn DatabaseManager>, limits: &LimitsConfig) -> Self {
        let policy = EnforcementPolicy::from(limits);
        Self {
            aggregator: UsageAggregator::new(database.clone()),
            enforcer: LifecycleEnforcer::new(database.clone(), policy),
            database,
            policy,
        }
    }

    /// Classify an account's current usage without applying any enforcement
    pub async fn usage_status(&self, account_id: i32) -> Result<AccountUsageStatus, AppError> {
        let account = self
            .database
            .accounts()
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account {}", account_id)))?;

        let snapshot = self.aggregator.compute_usage(account_id).await?;
        let limits = PlanLimits::from(&account);
        let classification = classify(&snapshot, &limits, &self.policy.thresholds)?;

        let usage_percentage = if limits.minutes_limit > 0.0 {
            (snapshot.total_minutes / limits.minutes_limit * 100.0).min(100.0)
        } else {
            100.0
        };

        let duration_cap_seconds = if classification.tier == WarningTier::Critical
            && !classification.any_limit_reached()
        {
            Some(self.policy.duration_cap_seconds)
        } else {
            None
        };

        Ok(AccountUsageStatus {
            account_id,
            total_minutes: snapshot.total_minutes,
            minutes_limit: limits.minutes_limit,
            remaining_minutes: classification.remaining_minutes,
            usage_percentage,
            active_assistants: snapshot.active_assistants,
            max_assistants: limits.assistant_limit,
            remaining_assistant_slots: classification.remaining_assistant_slots,
            usage_limit_reached: classification.usage_limit_reached,
            assistant_limit_reached: classification.assistant_limit_reached,
            any_limit_reached: classification.any_limit_reached(),
            warning_level: classification.tier,
            duration_cap_seconds,
        })
    }

    /// Run one enforcement pass over the account
    pub async fn enforce(&self, account_id: i32) -> Result<EnforcementDecision, AppError> {
        self.enforcer.enforce(account_id).await
    }

    /// Call-completion ingest: attribute a finished call's duration to the
    /// assistant that took it, then immediately re-evaluate the account.
    pub async fn record_call(
        &self,
        account_id: i32,
        assistant_id: i32,
        duration_seconds: f64,
    ) -> Result<EnforcementDecision, AppError> {
        if duration_seconds < 0.0 || duration_seconds.is_nan() {
            return Err(AppError::InvalidInput(format!(
                "call duration must be a non-negative number of seconds, got {}",
                duration_seconds
            )));
        }

        let assistant = self
            .database
            .assistants()
            .find_by_id(assistant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("assistant {}", assistant_id)))?;

        if assistant.account_id != account_id {
            return Err(AppError::NotFound(format!(
                "assistant {} for account {}",
                assistant_id, account_id
            )));
        }
        if assistant.state.is_deleted() {
            return Err(AppError::InvalidInput(format!(
                "assistant {} is deleted and can no longer take calls",
                assistant_id
            )));
        }

        self.database
            .assistants()
            .add_usage_minutes(assistant_id, duration_seconds / 60.0)
            .await?;

        self.enforce(account_id).await
    }
}
