use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::LimitsConfig;

/// Tenant (real or demo signup) that owns assistants and carries its plan
/// limits inline. Rows are created by the signup flow and read-only to the
/// metering core.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Tenant key used by the dashboard
    pub external_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub minutes_limit: f64,
    pub assistant_limit: i32,
    pub max_lifetime_days: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Create a demo account seeded with the configured plan defaults
    pub fn demo(
        external_id: impl Into<String>,
        email: impl Into<String>,
        limits: &LimitsConfig,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be auto-assigned by database
            external_id: external_id.into(),
            email: email.into(),
            created_at: now,
            minutes_limit: limits.minutes_limit,
            assistant_limit: limits.assistant_limit,
            max_lifetime_days: limits.max_lifetime_days,
        }
    }

    /// Builder method to override the plan limits
    pub fn with_limits(mut self, minutes_limit: f64, assistant_limit: i32) -> Self {
        self.minutes_limit = minutes_limit;
        self.assistant_limit = assistant_limit;
        self
    }

    /// Builder method to set the signup timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Builder method to set ID (for tests)
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// Whether the account's demo lifetime has run out at `now`
    pub fn lifetime_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) >= Duration::days(self.max_lifetime_days as i64)
    }
}
