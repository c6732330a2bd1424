use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    config::LimitsConfig,
    database::entities::AccountRecord,
    error::AppError,
    metering::aggregator::UsageSnapshot,
};

/// How close an account is to exhausting its minutes budget.
///
/// Ordered from calm to terminal; comparisons rely on the derive order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum WarningTier {
    None,
    Approaching,
    Critical,
    Exceeded,
}

/// Per-account plan limits, read off the account row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanLimits {
    pub minutes_limit: f64,
    pub assistant_limit: i32,
    pub max_lifetime_days: i32,
}

impl From<&AccountRecord> for PlanLimits {
    fn from(account: &AccountRecord) -> Self {
        Self {
            minutes_limit: account.minutes_limit,
            assistant_limit: account.assistant_limit,
            max_lifetime_days: account.max_lifetime_days,
        }
    }
}

/// Warning-tier cut points as fractions of the minutes budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub approaching: f64,
    pub critical: f64,
}

impl From<&LimitsConfig> for Thresholds {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            approaching: limits.approaching_threshold,
            critical: limits.critical_threshold,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            approaching: 0.8,
            critical: 0.9,
        }
    }
}

/// Result of classifying one usage snapshot against a plan
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tier: WarningTier,
    pub remaining_minutes: f64,
    pub remaining_assistant_slots: i32,
    pub usage_limit_reached: bool,
    pub assistant_limit_reached: bool,
}

impl Classification {
    /// Either budget being exhausted trips enforcement
    pub fn any_limit_reached(&self) -> bool {
        self.usage_limit_reached || self.assistant_limit_reached
    }
}

/// Map a usage snapshot to a warning tier and remaining-capacity figures.
///
/// Thresholds are evaluated most-severe first; the first match wins. The
/// assistant-count limit is a separate boolean, combined with the minutes
/// tier only through `Classification::any_limit_reached`.
pub fn classify(
    snapshot: &UsageSnapshot,
    limits: &PlanLimits,
    thresholds: &Thresholds,
) -> Result<Classification, AppError> {
    if snapshot.total_minutes.is_nan() || snapshot.total_minutes < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "total_minutes must be a non-negative number, got {}",
            snapshot.total_minutes
        )));
    }
    if limits.minutes_limit.is_nan() || limits.minutes_limit < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "minutes_limit must be a non-negative number, got {}",
            limits.minutes_limit
        )));
    }
    if limits.assistant_limit < 0 {
        return Err(AppError::InvalidInput(format!(
            "assistant_limit must be non-negative, got {}",
            limits.assistant_limit
        )));
    }

    let total = snapshot.total_minutes;
    let budget = limits.minutes_limit;

    let tier = if total >= budget {
        WarningTier::Exceeded
    } else if total >= budget * thresholds.critical {
        WarningTier::Critical
    } else if total >= budget * thresholds.approaching {
        WarningTier::Approaching
    } else {
        WarningTier::None
    };

    let active = snapshot.active_assistants as i32;

    Ok(Classification {
        tier,
        remaining_minutes: (budget - total).max(0.0),
        remaining_assistant_slots: (limits.assistant_limit - active).max(0),
        usage_limit_reached: tier == WarningTier::Exceeded,
        assistant_limit_reached: active >= limits.assistant_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(total_minutes: f64, active_assistants: u32) -> UsageSnapshot {
        UsageSnapshot {
            account_id: 1,
            total_minutes,
            active_assistants,
        }
    }

    fn demo_limits() -> PlanLimits {
        PlanLimits {
            minutes_limit: 10.0,
            assistant_limit: 3,
            max_lifetime_days: 7,
        }
    }

    #[test]
    fn test_tier_none_below_approaching_threshold() {
        // 10-minute budget, 7 consumed
        let result = classify(&snapshot(7.0, 1), &demo_limits(), &Thresholds::default()).unwrap();
        assert_eq!(result.tier, WarningTier::None);
        assert_eq!(result.remaining_minutes, 3.0);
        assert!(!result.any_limit_reached());
    }

    #[test]
    fn test_tier_approaching_at_eighty_percent() {
        let result = classify(&snapshot(8.5, 1), &demo_limits(), &Thresholds::default()).unwrap();
        assert_eq!(result.tier, WarningTier::Approaching);
        assert_eq!(result.remaining_minutes, 1.5);
    }

    #[test]
    fn test_tier_critical_at_ninety_percent() {
        let result = classify(&snapshot(9.2, 1), &demo_limits(), &Thresholds::default()).unwrap();
        assert_eq!(result.tier, WarningTier::Critical);
        assert!((result.remaining_minutes - 0.8).abs() < 1e-9);
        assert!(!result.usage_limit_reached);
    }

    #[test]
    fn test_tier_exceeded_at_limit() {
        let result = classify(&snapshot(10.0, 3), &demo_limits(), &Thresholds::default()).unwrap();
        assert_eq!(result.tier, WarningTier::Exceeded);
        assert_eq!(result.remaining_minutes, 0.0);
        assert!(result.usage_limit_reached);
        assert!(result.any_limit_reached());
    }

    #[test]
    fn test_exceeded_dominates_regardless_of_assistant_count() {
        for active in [0u32, 1, 50] {
            let result =
                classify(&snapshot(12.0, active), &demo_limits(), &Thresholds::default()).unwrap();
            assert_eq!(result.tier, WarningTier::Exceeded);
        }
    }

    #[test]
    fn test_assistant_limit_is_independent_of_minutes_tier() {
        let limits = PlanLimits {
            minutes_limit: 10.0,
            assistant_limit: 5,
            max_lifetime_days: 7,
        };
        let result = classify(&snapshot(2.0, 5), &limits, &Thresholds::default()).unwrap();
        assert_eq!(result.tier, WarningTier::None);
        assert!(result.assistant_limit_reached);
        assert!(result.any_limit_reached());
        assert_eq!(result.remaining_assistant_slots, 0);
    }

    #[test]
    fn test_remaining_figures_never_negative() {
        let result = classify(&snapshot(25.0, 9), &demo_limits(), &Thresholds::default()).unwrap();
        assert_eq!(result.remaining_minutes, 0.0);
        assert_eq!(result.remaining_assistant_slots, 0);
    }

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        let thresholds = Thresholds::default();
        let limits = demo_limits();

        assert_eq!(
            classify(&snapshot(8.0, 0), &limits, &thresholds).unwrap().tier,
            WarningTier::Approaching
        );
        assert_eq!(
            classify(&snapshot(9.0, 0), &limits, &thresholds).unwrap().tier,
            WarningTier::Critical
        );
        assert_eq!(
            classify(&snapshot(7.999, 0), &limits, &thresholds).unwrap().tier,
            WarningTier::None
        );
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let limits = demo_limits();
        let thresholds = Thresholds::default();

        assert!(classify(&snapshot(-1.0, 0), &limits, &thresholds).is_err());
        assert!(classify(&snapshot(f64::NAN, 0), &limits, &thresholds).is_err());

        let bad_limits = PlanLimits {
            minutes_limit: -10.0,
            assistant_limit: 3,
            max_lifetime_days: 7,
        };
        assert!(classify(&snapshot(1.0, 0), &bad_limits, &thresholds).is_err());

        let bad_limits = PlanLimits {
            minutes_limit: 10.0,
            assistant_limit: -1,
            max_lifetime_days: 7,
        };
        assert!(classify(&snapshot(1.0, 0), &bad_limits, &thresholds).is_err());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(WarningTier::None < WarningTier::Approaching);
        assert!(WarningTier::Approaching < WarningTier::Critical);
        assert!(WarningTier::Critical < WarningTier::Exceeded);
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WarningTier::Approaching).unwrap(),
            "\"approaching\""
        );
        assert_eq!(serde_json::to_string(&WarningTier::None).unwrap(), "\"none\"");
    }
}
