use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, sea_query::StringLen};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Assistant lifecycle state. Transitions are one-way:
/// `active -> expired -> deleted`, with `active -> deleted` allowed when
/// expiry and deletion are applied as a single step. `deleted` is terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum AssistantState {
    #[sea_orm(string_value = "active")]
    #[serde(rename = "active")]
    #[default]
    Active,
    #[sea_orm(string_value = "expired")]
    #[serde(rename = "expired")]
    Expired,
    #[sea_orm(string_value = "deleted")]
    #[serde(rename = "deleted")]
    Deleted,
}

impl AssistantState {
    pub fn is_active(&self) -> bool {
        matches!(self, AssistantState::Active)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, AssistantState::Deleted)
    }

    /// Whether the state machine permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: AssistantState) -> bool {
        matches!(
            (self, next),
            (AssistantState::Active, AssistantState::Expired)
                | (AssistantState::Active, AssistantState::Deleted)
                | (AssistantState::Expired, AssistantState::Deleted)
        )
    }

    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantState::Active => "active",
            AssistantState::Expired => "expired",
            AssistantState::Deleted => "deleted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "assistants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Cumulative minutes consumed by calls routed to this assistant.
    /// Invariant: never negative. Retained after deletion so the owning
    /// account's consumed budget survives enforcement.
    pub usage_minutes: f64,
    #[sea_orm(column_type = "String(StringLen::N(16))", default_value = "active")]
    pub state: AssistantState,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Create a new active assistant for an account
    pub fn new(account_id: i32, name: impl Into<String>) -> Self {
        Self {
            id: 0, // Will be auto-assigned by database
            account_id,
            name: name.into(),
            created_at: Utc::now(),
            usage_minutes: 0.0,
            state: AssistantState::Active,
        }
    }

    /// Builder method to set consumed minutes
    pub fn with_usage_minutes(mut self, usage_minutes: f64) -> Self {
        self.usage_minutes = usage_minutes;
        self
    }

    /// Builder method to set state
    pub fn with_state(mut self, state: AssistantState) -> Self {
        self.state = state;
        self
    }

    /// Builder method to set ID (for tests)
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_is_linear() {
        use AssistantState::*;

        assert!(Active.can_transition_to(Expired));
        assert!(Active.can_transition_to(Deleted));
        assert!(Expired.can_transition_to(Deleted));

        // No back-transitions, no self-transitions
        assert!(!Expired.can_transition_to(Active));
        assert!(!Deleted.can_transition_to(Active));
        assert!(!Deleted.can_transition_to(Expired));
        assert!(!Active.can_transition_to(Active));
        assert!(!Deleted.can_transition_to(Deleted));
    }

    #[test]
    fn test_state_round_trip_strings() {
        assert_eq!(AssistantState::Active.as_str(), "active");
        assert_eq!(AssistantState::Expired.as_str(), "expired");
        assert_eq!(AssistantState::Deleted.as_str(), "deleted");
    }

    #[test]
    fn test_new_assistant_defaults() {
        let assistant = Model::new(7, "receptionist");
        assert_eq!(assistant.account_id, 7);
        assert_eq!(assistant.usage_minutes, 0.0);
        assert!(assistant.state.is_active());
    }
}
